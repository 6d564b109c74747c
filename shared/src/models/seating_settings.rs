//! Seating Settings Model

use serde::{Deserialize, Serialize};

/// Which representation of the seating is authoritative
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeatingMode {
    /// `SeatingTable::assigned_guests` is authoritative
    Manual,
    /// Real assignment records are authoritative
    #[default]
    Auto,
}

/// What an RSVP change triggers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutoRecalcPolicy {
    #[default]
    OnRsvpChangeGroupOnly,
    Full,
    ManualTriggerOnly,
}

/// How adjacent-table scopes are treated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyPolicy {
    /// Apart rules only forbid sharing a table
    #[default]
    ForbidSameTableOnly,
    /// Apart rules also forbid neighbouring tables; together rules are checked
    EnforceAdjacentPlacement,
    Ignore,
}

/// Per-wedding seating settings (排座设置)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatingSettings {
    pub wedding_id: i64,
    pub mode: SeatingMode,
    /// Capacity of tables the solver opens
    pub seats_per_table: i32,
    /// Largest table the solver may open for one oversized cluster
    pub max_table_size: i32,
    pub auto_recalc_policy: AutoRecalcPolicy,
    pub adjacency_policy: AdjacencyPolicy,
    pub simulation_enabled: bool,
    pub enable_kids_table: bool,
    /// Advisory only: parties carry child counts, not ages
    pub kids_table_min_age: i32,
    pub kids_table_min_count: i32,
    pub avoid_singles_alone: bool,
    pub enable_zone_placement: bool,
}

impl Default for SeatingSettings {
    fn default() -> Self {
        Self {
            wedding_id: 0,
            mode: SeatingMode::Auto,
            seats_per_table: 10,
            max_table_size: 20,
            auto_recalc_policy: AutoRecalcPolicy::OnRsvpChangeGroupOnly,
            adjacency_policy: AdjacencyPolicy::ForbidSameTableOnly,
            simulation_enabled: true,
            enable_kids_table: false,
            kids_table_min_age: 0,
            kids_table_min_count: 4,
            avoid_singles_alone: false,
            enable_zone_placement: false,
        }
    }
}

impl SeatingSettings {
    pub fn for_wedding(wedding_id: i64) -> Self {
        Self {
            wedding_id,
            ..Self::default()
        }
    }

    /// Capacity of a table opened for clusters that fit the default size,
    /// never above `max_table_size`
    pub fn new_table_size(&self) -> i32 {
        self.seats_per_table.min(self.max_table_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"wedding_id":5,"seats_per_table":8,
            "adjacency_policy":"enforce_adjacent_placement"}"#;
        let settings: SeatingSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.wedding_id, 5);
        assert_eq!(settings.seats_per_table, 8);
        assert_eq!(settings.max_table_size, 20);
        assert_eq!(
            settings.adjacency_policy,
            AdjacencyPolicy::EnforceAdjacentPlacement
        );
        assert_eq!(settings.mode, SeatingMode::Auto);
        assert!(settings.simulation_enabled);
    }

    #[test]
    fn test_new_table_size_capped_by_max() {
        let mut settings = SeatingSettings::for_wedding(1);
        assert_eq!(settings.new_table_size(), 10);

        settings.max_table_size = 8;
        assert_eq!(settings.new_table_size(), 8);
    }
}
