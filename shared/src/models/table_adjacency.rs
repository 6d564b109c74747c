//! Table Adjacency Model

use serde::{Deserialize, Serialize};

/// Directed physical adjacency edge `table_id → adjacent_table_id`
///
/// Only consulted for adjacent-table preference scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableAdjacency {
    pub wedding_id: i64,
    pub table_id: i64,
    pub adjacent_table_id: i64,
}
