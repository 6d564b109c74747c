//! Run context and input snapshot
//!
//! A [`RunContext`] is created per run and passed explicitly through the
//! constraint builder and the placement solver; there is no process-wide
//! "current run" state.

use super::conflicts::ConflictReporter;
use serde::{Deserialize, Serialize};
use shared::models::{
    AssignmentType, Guest, GuestGroup, SeatingPreference, SeatingSettings, SeatingTable,
    TableAdjacency, Wedding,
};

/// Everything stored for one wedding, read in a single transaction
///
/// Also the format of the JSON import consumed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeddingData {
    pub wedding: Wedding,
    pub settings: SeatingSettings,
    #[serde(default)]
    pub guests: Vec<Guest>,
    #[serde(default)]
    pub groups: Vec<GuestGroup>,
    #[serde(default)]
    pub tables: Vec<SeatingTable>,
    #[serde(default)]
    pub adjacency: Vec<TableAdjacency>,
    #[serde(default)]
    pub preferences: Vec<SeatingPreference>,
}

impl WeddingData {
    pub fn guest(&self, guest_id: i64) -> Option<&Guest> {
        self.guests.iter().find(|g| g.id == guest_id)
    }

    pub fn table(&self, table_id: i64) -> Option<&SeatingTable> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn group(&self, group_id: i64) -> Option<&GuestGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }
}

/// Per-run state
#[derive(Debug)]
pub struct RunContext {
    pub run_id: String,
    pub wedding_id: i64,
    pub assignment_type: AssignmentType,
    pub settings: SeatingSettings,
    pub conflicts: ConflictReporter,
}

impl RunContext {
    pub fn new(
        run_id: impl Into<String>,
        wedding_id: i64,
        assignment_type: AssignmentType,
        settings: SeatingSettings,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            wedding_id,
            assignment_type,
            settings,
            conflicts: ConflictReporter::new(),
        }
    }
}
