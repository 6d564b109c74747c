//! Seating Table Model

use serde::{Deserialize, Serialize};

/// 桌台类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    Adults,
    Kids,
    #[default]
    Mixed,
}

/// Seating table entity (桌台)
///
/// `table_number` is unique per wedding. In manual mode `assigned_guests` is
/// the authoritative seating; in auto mode it is rebuilt from the real
/// assignment partition after every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingTable {
    pub id: i64,
    pub wedding_id: i64,
    pub table_name: String,
    pub table_number: i32,
    pub capacity: i32,
    #[serde(default)]
    pub table_type: TableType,
    #[serde(default)]
    pub assigned_guests: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Opened by the solver rather than by a planner
    #[serde(default)]
    pub auto_created: bool,
    /// A planner confirmed seating beyond `capacity`
    #[serde(default)]
    pub capacity_override: bool,
}

impl SeatingTable {
    /// Build a table the solver opens on its own
    pub fn auto(
        id: i64,
        wedding_id: i64,
        table_number: i32,
        capacity: i32,
        table_type: TableType,
    ) -> Self {
        Self {
            id,
            wedding_id,
            table_name: format!("Table {}", table_number),
            table_number,
            capacity,
            table_type,
            assigned_guests: Vec::new(),
            zone: None,
            auto_created: true,
            capacity_override: false,
        }
    }
}
