//! Seating Run Result Model

use super::{SeatingConflict, SeatingTable};
use serde::{Deserialize, Serialize};

/// Outcome of a full or incremental run
///
/// A run always completes; `success` is false when at least one party in
/// scope was left unplaced. Conflicts are listed either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub success: bool,
    pub assignments_created: usize,
    pub tables_created: usize,
    pub conflicts: Vec<SeatingConflict>,
    #[serde(default)]
    pub unplaced_guest_ids: Vec<i64>,
}

/// Seating as seen from one partition: tables (including simulated ones) and
/// their guests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingPlan {
    pub tables: Vec<SeatingTable>,
    pub assignments: Vec<super::SeatAssignment>,
}

/// Result of a manual assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualAssignResult {
    pub table_id: i64,
    pub seats_used: i32,
    /// Seating now exceeds the table capacity (explicitly confirmed)
    pub over_capacity: bool,
}
