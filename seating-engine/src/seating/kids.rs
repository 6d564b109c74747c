//! Kids-table carve-out
//!
//! Parties only carry an aggregate child count, so eligibility works on
//! clusters: a cluster whose children outnumber its adults is a kid cluster.
//! `kids_table_min_age` cannot be checked at this granularity.

use super::constraints::{Cluster, ConstraintGraph};
use shared::models::{SeatingSettings, TableType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KidsTablePolicy {
    active: bool,
    table_size: i32,
}

impl KidsTablePolicy {
    pub fn evaluate(settings: &SeatingSettings, graph: &ConstraintGraph) -> Self {
        let children = graph.total_children();
        let active = settings.enable_kids_table
            && children > 0
            && children >= settings.kids_table_min_count;

        if settings.enable_kids_table {
            tracing::debug!(
                children,
                min_count = settings.kids_table_min_count,
                active,
                "Kids table policy evaluated"
            );
        }

        Self {
            active,
            table_size: settings.new_table_size(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a table of this type may seat the cluster
    pub fn accepts(table_type: TableType, cluster: &Cluster) -> bool {
        match table_type {
            TableType::Kids => cluster.is_kid_cluster(),
            TableType::Adults => !cluster.is_kid_cluster(),
            TableType::Mixed => true,
        }
    }

    /// Preference tier among compatible tables (lower first)
    pub fn tier(table_type: TableType, cluster: &Cluster) -> u8 {
        match (table_type, cluster.is_kid_cluster()) {
            (TableType::Kids, true) => 0,
            _ => 1,
        }
    }

    /// Number of new kids tables needed so `kid_weight` seats fit next to
    /// `free_kids_seats` already available on kids tables
    pub fn tables_to_reserve(&self, kid_weight: i32, free_kids_seats: i32) -> usize {
        if !self.active || self.table_size <= 0 {
            return 0;
        }
        let missing = kid_weight - free_kids_seats.max(0);
        if missing <= 0 {
            return 0;
        }
        ((missing + self.table_size - 1) / self.table_size) as usize
    }
}
