//! Seating Preference Model

use serde::{Deserialize, Serialize};

/// Whether the two parties should sit together or apart
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceType {
    Together,
    Apart,
}

/// Spatial scope of a preference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceScope {
    SameTable,
    AdjacentTables,
}

/// Hard (`Must`) or soft (`Try`) preference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceStrength {
    Must,
    Try,
}

/// Seating preference edge (座位偏好)
///
/// Symmetric: (A, B) means the same as (B, A).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingPreference {
    pub id: i64,
    pub wedding_id: i64,
    pub guest_a_id: i64,
    pub guest_b_id: i64,
    #[serde(rename = "type")]
    pub pref_type: PreferenceType,
    pub scope: PreferenceScope,
    pub strength: PreferenceStrength,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SeatingPreference {
    /// The pair in canonical (low, high) order
    pub fn pair(&self) -> (i64, i64) {
        if self.guest_a_id <= self.guest_b_id {
            (self.guest_a_id, self.guest_b_id)
        } else {
            (self.guest_b_id, self.guest_a_id)
        }
    }

    pub fn is_must(&self) -> bool {
        self.strength == PreferenceStrength::Must
    }

    /// Whether the preference names the given guest
    pub fn involves(&self, guest_id: i64) -> bool {
        self.guest_a_id == guest_id || self.guest_b_id == guest_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_symmetric() {
        let pref = SeatingPreference {
            id: 1,
            wedding_id: 1,
            guest_a_id: 9,
            guest_b_id: 4,
            pref_type: PreferenceType::Apart,
            scope: PreferenceScope::SameTable,
            strength: PreferenceStrength::Must,
            enabled: true,
        };
        assert_eq!(pref.pair(), (4, 9));
        assert!(pref.involves(9));
        assert!(!pref.involves(5));
    }

    #[test]
    fn test_deserialize_defaults_enabled() {
        let json = r#"{"id":3,"wedding_id":1,"guest_a_id":1,"guest_b_id":2,
            "type":"together","scope":"adjacent_tables","strength":"try"}"#;
        let pref: SeatingPreference = serde_json::from_str(json).unwrap();
        assert!(pref.enabled);
        assert_eq!(pref.pref_type, PreferenceType::Together);
        assert_eq!(pref.scope, PreferenceScope::AdjacentTables);
        assert_eq!(pref.strength, PreferenceStrength::Try);
    }
}
