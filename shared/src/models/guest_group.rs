//! Guest Group Model

use serde::{Deserialize, Serialize};

/// Guest group entity (宾客分组)
///
/// Lower `priority` values are placed first and get the preferred tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestGroup {
    pub id: i64,
    pub wedding_id: i64,
    pub name: String,
    pub priority: i32,
    /// Preferred zone, honoured only when zone placement is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}
