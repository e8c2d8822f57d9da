//! Access to the external item catalog.
//!
//! The reconciler only talks to the catalog through [`CatalogApi`], so tests can swap in an
//! in-memory catalog while production uses [`client::HttpCatalog`].

pub mod client;
pub mod protocol;

use crate::errors::CatalogError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Group id used for a target group that would only be created outside of a dry run.
pub const PLACEHOLDER_GROUP_ID: i64 = -1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(deserialize_with = "protocol::deserialize_id")]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

impl Group {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Group {
            id,
            name: Some(name.into()),
        }
    }

    /// Trimmed display name; empty when the service returned no name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// A row from the items listing. Only its presence matters to the cleanup scan.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct CatalogItem(pub serde_json::Value);

/// A single-field change applied to an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemUpdate {
    AssignGroup(i64),
    ClearCode,
}

impl ItemUpdate {
    pub fn into_request(self, item_id: i64) -> protocol::UpdateItemRequest {
        match self {
            ItemUpdate::AssignGroup(group_id) => protocol::UpdateItemRequest {
                id: item_id,
                group_id: Some(group_id),
                code: None,
            },
            ItemUpdate::ClearCode => protocol::UpdateItemRequest {
                id: item_id,
                group_id: None,
                code: Some(String::new()),
            },
        }
    }
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// One page of groups whose name contains `needle`.
    async fn groups_named_like(
        &self,
        needle: &str,
        page: u32,
        rows: u32,
    ) -> Result<Vec<Group>, CatalogError>;

    /// One page of items assigned to `group_id`.
    async fn items_in_group(
        &self,
        group_id: i64,
        page: u32,
        rows: u32,
    ) -> Result<Vec<CatalogItem>, CatalogError>;

    async fn update_item(&self, item_id: i64, update: ItemUpdate) -> Result<(), CatalogError>;

    async fn create_group(&self, name: &str) -> Result<Group, CatalogError>;

    /// Deleting a group that no longer exists succeeds.
    async fn delete_group(&self, group_id: i64) -> Result<(), CatalogError>;
}

/// Walks the groups listing page by page until an empty page comes back.
pub async fn list_all_groups(
    catalog: &dyn CatalogApi,
    page_size: u32,
) -> Result<Vec<Group>, CatalogError> {
    let mut groups = Vec::new();
    let mut page = 1;

    loop {
        let rows = catalog.groups_named_like("", page, page_size).await?;
        if rows.is_empty() {
            break;
        }
        groups.extend(rows);
        page += 1;
    }

    tracing::debug!(pages = page - 1, groups = groups.len(), "Loaded catalog groups");
    Ok(groups)
}
