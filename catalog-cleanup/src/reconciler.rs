//! Moves `xxx`-prefixed items into a single target group and removes the groups they leave
//! empty.
//!
//! A run has three strictly ordered phases:
//! 1. Resolve the target group from a full group listing, creating it when missing.
//! 2. Migrate candidates batch by batch. Every item gets two concurrent updates (group
//!    reassignment and code clearing); all items of a batch are in flight together.
//! 3. Re-scan the group names the candidates came from and delete any that are now empty.
//!
//! In a dry run the catalog is only read; every write is skipped and reported as if it
//! had succeeded.

use crate::catalog::{self, CatalogApi, Group, ItemUpdate, PLACEHOLDER_GROUP_ID};
use crate::errors::CatalogError;
use crate::metrics_defs::{GROUPS_CREATED, GROUPS_DELETED, ITEMS_MOVED, ITEMS_PARTIALLY_MOVED};
use crate::migration::{ItemMigration, MigrationStep, MigrationTally};
use crate::naming::{base_word, is_candidate, normalize_name};
use indexmap::IndexSet;
use serde_json::{Map, Value};
use shared::counter;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;

/// An item as exported from the catalog and posted by the caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceItem {
    pub id: Option<i64>,
    pub name: String,
    /// Name of the group the item currently belongs to
    pub group: String,
    pub group_id: Option<i64>,
}

impl SourceItem {
    /// Reads one posted row. Both the plain field names and the catalog export's column
    /// headers are accepted. Rows that are not objects yield an unnamed item, and ids that
    /// do not parse as integers are dropped.
    pub fn from_row(row: &Value) -> SourceItem {
        let Some(row) = row.as_object() else {
            return SourceItem::default();
        };

        SourceItem {
            id: field(row, &["id", "ID"]).and_then(id_value),
            name: field(row, &["name", "Pavadinimas"])
                .map(text_value)
                .unwrap_or_default(),
            group: field(row, &["group", "Grupė"])
                .map(text_value)
                .unwrap_or_default(),
            group_id: field(row, &["groupId", "GrupėId"]).and_then(id_value),
        }
    }
}

fn field<'a>(row: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| row.get(*name))
        .find(|value| !value.is_null())
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn id_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileOptions {
    pub target_group_name: String,
    pub dry_run: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub received_items: usize,
    pub processed_items: usize,
    pub actually_moved: usize,
    pub groups_checked: usize,
    pub groups_deleted: usize,
}

#[derive(Clone)]
pub struct GroupReconciler {
    catalog: Arc<dyn CatalogApi>,
    page_size: u32,
    batch_size: usize,
}

impl GroupReconciler {
    pub fn new(catalog: Arc<dyn CatalogApi>, page_size: u32, batch_size: usize) -> Self {
        GroupReconciler {
            catalog,
            page_size: page_size.max(1),
            batch_size: batch_size.max(1),
        }
    }

    pub async fn reconcile(
        &self,
        items: &[SourceItem],
        options: &ReconcileOptions,
    ) -> Result<ReconcileSummary, CatalogError> {
        let target_name = options.target_group_name.trim();
        let dry_run = options.dry_run;

        let mut groups_by_name = self.load_groups_by_name().await?;
        let target = self
            .ensure_group(target_name, &mut groups_by_name, dry_run)
            .await?;

        let candidates: Vec<&SourceItem> =
            items.iter().filter(|item| is_candidate(&item.name)).collect();

        let mut touched_keys = IndexSet::new();
        let tally = self
            .migrate(&candidates, &target, dry_run, &mut touched_keys)
            .await;

        let (groups_checked, groups_deleted) = self
            .delete_emptied_groups(&touched_keys, target_name, dry_run)
            .await?;

        let summary = ReconcileSummary {
            received_items: items.len(),
            processed_items: candidates.len(),
            actually_moved: tally.complete,
            groups_checked,
            groups_deleted,
        };

        tracing::info!(
            dry_run,
            target_group = target_name,
            received = summary.received_items,
            processed = summary.processed_items,
            moved = summary.actually_moved,
            half_done = tally.half_done,
            failed = tally.failed,
            groups_checked,
            groups_deleted,
            "Catalog cleanup finished"
        );

        Ok(summary)
    }

    async fn load_groups_by_name(&self) -> Result<HashMap<String, Group>, CatalogError> {
        let groups = catalog::list_all_groups(self.catalog.as_ref(), self.page_size).await?;

        Ok(groups
            .into_iter()
            .filter(|g| !g.display_name().is_empty())
            .map(|g| (normalize_name(g.display_name()), g))
            .collect())
    }

    /// Finds the group named `name` (case-insensitively), creating it outside of a dry run.
    /// A dry run stands in a placeholder group instead.
    async fn ensure_group(
        &self,
        name: &str,
        groups_by_name: &mut HashMap<String, Group>,
        dry_run: bool,
    ) -> Result<Group, CatalogError> {
        let key = normalize_name(name);
        if let Some(group) = groups_by_name.get(&key) {
            return Ok(group.clone());
        }

        // The full listing may be stale by now; ask the service directly before creating.
        let hits = self
            .catalog
            .groups_named_like(name, 1, self.page_size)
            .await?;
        if let Some(group) = hits
            .into_iter()
            .find(|g| normalize_name(g.display_name()) == key)
        {
            groups_by_name.insert(key, group.clone());
            return Ok(group);
        }

        if dry_run {
            tracing::info!(group = name, "Dry run: target group would be created");
            return Ok(Group::new(PLACEHOLDER_GROUP_ID, name));
        }

        let group = self.catalog.create_group(name).await?;
        tracing::info!(group = name, group_id = group.id, "Created target group");
        counter!(GROUPS_CREATED).increment(1);
        groups_by_name.insert(key, group.clone());
        Ok(group)
    }

    async fn migrate(
        &self,
        candidates: &[&SourceItem],
        target: &Group,
        dry_run: bool,
        touched_keys: &mut IndexSet<String>,
    ) -> MigrationTally {
        let mut tally = MigrationTally::default();

        for batch in candidates.chunks(self.batch_size) {
            for item in batch {
                let original_group = normalize_name(&item.group);
                if !original_group.is_empty() {
                    touched_keys.insert(original_group);
                }
                let word = base_word(&item.name);
                if !word.is_empty() {
                    touched_keys.insert(word);
                }
            }

            let mut join_set = JoinSet::new();
            for item in batch {
                join_set.spawn(migrate_item(
                    self.catalog.clone(),
                    item.id,
                    target.id,
                    dry_run,
                ));
            }

            while let Some(result) = join_set.join_next().await {
                match result {
                    Ok(migration) => {
                        if migration.is_complete() {
                            counter!(ITEMS_MOVED).increment(1);
                        } else {
                            counter!(ITEMS_PARTIALLY_MOVED).increment(1);
                            tracing::info!(
                                item_id = ?migration.item_id(),
                                state = ?migration.state(),
                                "Item not fully moved"
                            );
                        }
                        tally.add(&migration);
                    }
                    Err(e) => {
                        tracing::error!("Migration task panicked: {e}");
                        tally.failed += 1;
                    }
                }
            }

            tracing::debug!(batch = batch.len(), moved = tally.complete, "Batch migrated");
        }

        tally
    }

    /// Checks every group reachable from the touched keys once and deletes the empty ones.
    /// Returns `(checked, deleted)`.
    async fn delete_emptied_groups(
        &self,
        touched_keys: &IndexSet<String>,
        target_name: &str,
        dry_run: bool,
    ) -> Result<(usize, usize), CatalogError> {
        let target_key = normalize_name(target_name);
        let mut seen = HashSet::new();
        let mut checked = 0;
        let mut deleted = 0;

        for key in touched_keys {
            let hits = self
                .catalog
                .groups_named_like(key, 1, self.page_size)
                .await?;

            for group in hits {
                let name = group.display_name();
                if name.is_empty() || normalize_name(name) == target_key {
                    continue;
                }
                if !seen.insert(group.id) {
                    continue;
                }

                let remaining = self.catalog.items_in_group(group.id, 1, 1).await?;
                checked += 1;
                if !remaining.is_empty() {
                    continue;
                }

                if dry_run {
                    tracing::info!(
                        group = name,
                        group_id = group.id,
                        "Dry run: empty group would be deleted"
                    );
                } else {
                    self.catalog.delete_group(group.id).await?;
                    tracing::info!(group = name, group_id = group.id, "Deleted empty group");
                    counter!(GROUPS_DELETED).increment(1);
                    deleted += 1;
                }
            }
        }

        Ok((checked, deleted))
    }
}

async fn migrate_item(
    catalog: Arc<dyn CatalogApi>,
    item_id: Option<i64>,
    target_group_id: i64,
    dry_run: bool,
) -> ItemMigration {
    let mut migration = ItemMigration::new(item_id);

    let Some(id) = item_id else {
        tracing::warn!("Candidate item has no id");
        migration.record(MigrationStep::AssignGroup, false);
        return migration;
    };

    if dry_run {
        migration.record(MigrationStep::AssignGroup, true);
        migration.record(MigrationStep::ClearCode, true);
        return migration;
    }

    let (assigned, cleared) = tokio::join!(
        catalog.update_item(id, ItemUpdate::AssignGroup(target_group_id)),
        catalog.update_item(id, ItemUpdate::ClearCode),
    );

    for (step, result) in [
        (MigrationStep::AssignGroup, assigned),
        (MigrationStep::ClearCode, cleared),
    ] {
        if let Err(e) = &result {
            tracing::warn!(item_id = id, step = ?step, error = %e, "Item update failed");
        }
        migration.record(step, result.is_ok());
    }

    migration
}
