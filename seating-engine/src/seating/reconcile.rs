//! Reconciliation between the two seating representations
//!
//! - Auto mode: real assignment rows are authoritative; each table's
//!   `assigned_guests` is a cached view rebuilt from them.
//! - Manual mode: `assigned_guests` is authoritative; the real partition is
//!   rebuilt from the tables.

use shared::models::{AssignmentType, Guest, SeatAssignment, SeatingTable};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Rebuild `assigned_guests` on every table from one partition's rows
pub fn rebuild_assigned_guests(tables: &mut [SeatingTable], assignments: &[SeatAssignment]) {
    let mut by_table: HashMap<i64, Vec<i64>> = HashMap::new();
    for a in assignments {
        by_table.entry(a.table_id).or_default().push(a.guest_id);
    }

    for table in tables.iter_mut() {
        let mut guests = by_table.remove(&table.id).unwrap_or_default();
        guests.sort_unstable();
        guests.dedup();
        table.assigned_guests = guests;
    }
}

/// Derive the real partition from the tables' guest lists
///
/// A guest listed at several tables keeps the lowest-numbered one. Unknown
/// guest ids are skipped.
pub fn assignments_from_tables(
    wedding_id: i64,
    tables: &[SeatingTable],
    guests: &[Guest],
) -> Vec<SeatAssignment> {
    let weights: HashMap<i64, i32> = guests.iter().map(|g| (g.id, g.seat_weight())).collect();

    let mut ordered: Vec<&SeatingTable> = tables.iter().collect();
    ordered.sort_by_key(|t| (t.table_number, t.id));

    let mut seen = HashSet::new();
    let mut assignments = Vec::new();
    for table in ordered {
        for &guest_id in &table.assigned_guests {
            let Some(&seats_count) = weights.get(&guest_id) else {
                tracing::warn!(
                    table_id = table.id,
                    guest_id,
                    "Table lists unknown guest, skipped"
                );
                continue;
            };
            if !seen.insert(guest_id) {
                tracing::warn!(
                    table_id = table.id,
                    guest_id,
                    "Guest listed at more than one table, keeping the first"
                );
                continue;
            }
            assignments.push(SeatAssignment {
                wedding_id,
                table_id: table.id,
                guest_id,
                seats_count,
                assignment_type: AssignmentType::Real,
            });
        }
    }

    assignments.sort_by_key(|a| (a.table_id, a.guest_id));
    assignments
}

/// Seats used per table
pub fn table_usage(assignments: &[SeatAssignment]) -> BTreeMap<i64, i32> {
    let mut usage = BTreeMap::new();
    for a in assignments {
        *usage.entry(a.table_id).or_insert(0) += a.seats_count;
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{RsvpStatus, TableType};

    fn table(id: i64, number: i32, guests: Vec<i64>) -> SeatingTable {
        SeatingTable {
            id,
            wedding_id: 1,
            table_name: format!("T{}", number),
            table_number: number,
            capacity: 10,
            table_type: TableType::Mixed,
            assigned_guests: guests,
            zone: None,
            auto_created: false,
            capacity_override: false,
        }
    }

    fn row(table_id: i64, guest_id: i64, seats_count: i32, t: AssignmentType) -> SeatAssignment {
        SeatAssignment {
            wedding_id: 1,
            table_id,
            guest_id,
            seats_count,
            assignment_type: t,
        }
    }

    #[test]
    fn test_rebuild_replaces_stale_guests() {
        let mut tables = vec![table(1, 1, vec![99]), table(2, 2, vec![4])];
        let rows = vec![
            row(1, 5, 2, AssignmentType::Real),
            row(1, 3, 1, AssignmentType::Real),
        ];
        rebuild_assigned_guests(&mut tables, &rows);
        assert_eq!(tables[0].assigned_guests, vec![3, 5]);
        assert!(tables[1].assigned_guests.is_empty());
    }

    #[test]
    fn test_assignments_from_tables() {
        let guests: Vec<Guest> = [(1, 2, 1), (2, 1, 0)]
            .into_iter()
            .map(|(id, adults, children)| Guest {
                id,
                wedding_id: 1,
                name: format!("G{}", id),
                adults_attending: adults,
                children_attending: children,
                rsvp_status: RsvpStatus::Confirmed,
                group_id: None,
                created_at: id,
            })
            .collect();
        let tables = vec![table(7, 2, vec![2, 1]), table(8, 1, vec![2, 42])];

        let rows = assignments_from_tables(1, &tables, &guests);
        assert_eq!(
            rows,
            vec![
                row(7, 1, 3, AssignmentType::Real),
                row(8, 2, 1, AssignmentType::Real),
            ]
        );
        assert_eq!(table_usage(&rows).get(&7), Some(&3));
    }
}
