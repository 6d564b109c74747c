//! Guest Party Model

use serde::{Deserialize, Serialize};

/// RSVP status of a guest party
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
}

/// Guest party entity (宾客)
///
/// One record is one allocation unit: the solver never splits a party across
/// tables. Its seat weight is the attending head-count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: i64,
    pub wedding_id: i64,
    pub name: String,
    pub adults_attending: i32,
    pub children_attending: i32,
    #[serde(default)]
    pub rsvp_status: RsvpStatus,
    pub group_id: Option<i64>,
    /// Creation timestamp (millis), used as the last placement tie-break
    pub created_at: i64,
}

impl Guest {
    /// Seats this party occupies at a table
    pub fn seat_weight(&self) -> i32 {
        self.adults_attending.max(0) + self.children_attending.max(0)
    }

    /// Only confirmed parties with at least one attendee are seated
    pub fn is_seatable(&self) -> bool {
        self.rsvp_status == RsvpStatus::Confirmed && self.seat_weight() > 0
    }
}
