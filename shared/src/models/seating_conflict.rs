//! Seating Conflict Model

use serde::{Deserialize, Serialize};

/// 冲突类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// A cluster does not fit a regular table (or any table at all)
    CapacityExceeded,
    /// Two must rules contradict each other
    MutuallyUnsatisfiableMusts,
    /// A must-adjacent rule could not be placed next to its partner
    NoAdjacentTableAvailable,
    /// A preference names a guest that does not exist
    DanglingReference,
    /// A pinned neighbour makes an apart rule impossible to honour
    ApartViolated,
}

/// A constraint the run could not satisfy
///
/// Conflicts are reported, never persisted over existing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingConflict {
    pub kind: ConflictKind,
    pub involved_guest_ids: Vec<i64>,
    pub involved_table_ids: Vec<i64>,
    pub reason: String,
}

impl SeatingConflict {
    pub fn new(kind: ConflictKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            involved_guest_ids: Vec::new(),
            involved_table_ids: Vec::new(),
            reason: reason.into(),
        }
    }

    pub fn with_guests(mut self, guest_ids: impl IntoIterator<Item = i64>) -> Self {
        self.involved_guest_ids.extend(guest_ids);
        self.involved_guest_ids.sort_unstable();
        self.involved_guest_ids.dedup();
        self
    }

    pub fn with_tables(mut self, table_ids: impl IntoIterator<Item = i64>) -> Self {
        self.involved_table_ids.extend(table_ids);
        self.involved_table_ids.sort_unstable();
        self.involved_table_ids.dedup();
        self
    }

    pub fn involves_guest(&self, guest_id: i64) -> bool {
        self.involved_guest_ids.contains(&guest_id)
    }
}
