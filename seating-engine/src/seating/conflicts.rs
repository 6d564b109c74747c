//! Conflict reporter
//!
//! Collects every constraint a run could not satisfy. Reporting never aborts
//! the run; identical conflicts are recorded once.

use shared::models::{ConflictKind, SeatingConflict, SeatingPreference};
use std::collections::HashSet;

type ConflictKey = (ConflictKind, Vec<i64>, Vec<i64>, String);

#[derive(Debug, Default)]
pub struct ConflictReporter {
    conflicts: Vec<SeatingConflict>,
    seen: HashSet<ConflictKey>,
}

impl ConflictReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a conflict (duplicates are dropped)
    pub fn report(&mut self, conflict: SeatingConflict) {
        let key = (
            conflict.kind,
            conflict.involved_guest_ids.clone(),
            conflict.involved_table_ids.clone(),
            conflict.reason.clone(),
        );
        if !self.seen.insert(key) {
            return;
        }

        tracing::debug!(
            kind = ?conflict.kind,
            guests = ?conflict.involved_guest_ids,
            tables = ?conflict.involved_table_ids,
            reason = %conflict.reason,
            "Seating conflict recorded"
        );
        self.conflicts.push(conflict);
    }

    pub fn dangling_reference(&mut self, preference: &SeatingPreference, detail: &str) {
        self.report(
            SeatingConflict::new(
                ConflictKind::DanglingReference,
                format!("Preference {} dropped: {}", preference.id, detail),
            )
            .with_guests([preference.guest_a_id, preference.guest_b_id]),
        );
    }

    pub fn mutually_unsatisfiable(
        &mut self,
        guest_ids: impl IntoIterator<Item = i64>,
        preference_ids: &[i64],
        detail: &str,
    ) {
        let ids = preference_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.report(
            SeatingConflict::new(
                ConflictKind::MutuallyUnsatisfiableMusts,
                format!("Preferences [{}] contradict each other: {}", ids, detail),
            )
            .with_guests(guest_ids),
        );
    }

    pub fn capacity_exceeded(
        &mut self,
        guest_ids: impl IntoIterator<Item = i64>,
        table_ids: impl IntoIterator<Item = i64>,
        reason: String,
    ) {
        self.report(
            SeatingConflict::new(ConflictKind::CapacityExceeded, reason)
                .with_guests(guest_ids)
                .with_tables(table_ids),
        );
    }

    pub fn no_adjacent_table(
        &mut self,
        guest_ids: impl IntoIterator<Item = i64>,
        table_ids: impl IntoIterator<Item = i64>,
        reason: String,
    ) {
        self.report(
            SeatingConflict::new(ConflictKind::NoAdjacentTableAvailable, reason)
                .with_guests(guest_ids)
                .with_tables(table_ids),
        );
    }

    pub fn apart_violated(
        &mut self,
        guest_ids: impl IntoIterator<Item = i64>,
        table_ids: impl IntoIterator<Item = i64>,
        reason: String,
    ) {
        self.report(
            SeatingConflict::new(ConflictKind::ApartViolated, reason)
                .with_guests(guest_ids)
                .with_tables(table_ids),
        );
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeatingConflict> {
        self.conflicts.iter()
    }

    pub fn count_of(&self, kind: ConflictKind) -> usize {
        self.conflicts.iter().filter(|c| c.kind == kind).count()
    }

    /// Conflicts in the order they were found
    pub fn into_conflicts(self) -> Vec<SeatingConflict> {
        self.conflicts
    }
}
