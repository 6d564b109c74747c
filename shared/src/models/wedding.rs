//! Wedding Model

use serde::{Deserialize, Serialize};

/// Wedding entity (婚礼)
///
/// Every other seating record is scoped by `wedding_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wedding {
    pub id: i64,
    pub name: String,
    /// Event date as `YYYY-MM-DD`
    pub event_date: Option<String>,
}
