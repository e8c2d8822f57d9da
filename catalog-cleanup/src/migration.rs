//! Per-item migration bookkeeping.
//!
//! Moving an item takes two independent catalog updates: reassigning its group and clearing
//! its code. Each outcome is fed into an [`ItemMigration`], which only reaches
//! [`MigrationState::Complete`] once both have succeeded.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationState {
    Pending,
    GroupUpdated,
    CodeCleared,
    Complete,
    PartialFailure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationStep {
    AssignGroup,
    ClearCode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemMigration {
    item_id: Option<i64>,
    state: MigrationState,
    succeeded: Vec<MigrationStep>,
}

impl ItemMigration {
    pub fn new(item_id: Option<i64>) -> Self {
        ItemMigration {
            item_id,
            state: MigrationState::Pending,
            succeeded: Vec::new(),
        }
    }

    pub fn item_id(&self) -> Option<i64> {
        self.item_id
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == MigrationState::Complete
    }

    /// Steps that went through, in the order they were recorded.
    pub fn succeeded_steps(&self) -> &[MigrationStep] {
        &self.succeeded
    }

    /// Applies the outcome of one update. A failure is terminal, although later successes
    /// are still remembered; repeating a step that already succeeded changes nothing.
    pub fn record(&mut self, step: MigrationStep, ok: bool) -> MigrationState {
        use MigrationState::*;
        use MigrationStep::*;

        if self.state == Complete {
            return self.state;
        }
        if !ok {
            self.state = PartialFailure;
            return self.state;
        }
        if self.succeeded.contains(&step) {
            return self.state;
        }
        self.succeeded.push(step);
        if self.state == PartialFailure {
            return self.state;
        }

        self.state = match (self.state, step) {
            (Pending, AssignGroup) => GroupUpdated,
            (Pending, ClearCode) => CodeCleared,
            (GroupUpdated, ClearCode) | (CodeCleared, AssignGroup) => Complete,
            (state, _) => state,
        };
        self.state
    }
}

/// Aggregated outcome of a migration run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MigrationTally {
    pub complete: usize,
    /// Items where exactly one of the two updates went through
    pub half_done: usize,
    pub failed: usize,
}

impl MigrationTally {
    pub fn add(&mut self, migration: &ItemMigration) {
        match migration.state() {
            MigrationState::Complete => self.complete += 1,
            _ if migration.succeeded_steps().len() == 1 => self.half_done += 1,
            _ => self.failed += 1,
        }
    }
}
