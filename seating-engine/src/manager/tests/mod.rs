use super::*;
use shared::models::{
    Guest, GuestGroup, PreferenceScope, PreferenceStrength, PreferenceType, RsvpStatus,
    SeatingPreference, TableType, Wedding,
};

const WEDDING_ID: i64 = 1;

fn create_test_manager() -> SeatingManager {
    let storage = SeatingStorage::open_in_memory().unwrap();
    SeatingManager::with_storage(storage)
}

fn guest(id: i64, adults: i32, children: i32, group_id: Option<i64>) -> Guest {
    Guest {
        id,
        wedding_id: WEDDING_ID,
        name: format!("Guest {}", id),
        adults_attending: adults,
        children_attending: children,
        rsvp_status: RsvpStatus::Confirmed,
        group_id,
        created_at: id,
    }
}

fn group(id: i64, priority: i32) -> GuestGroup {
    GuestGroup {
        id,
        wedding_id: WEDDING_ID,
        name: format!("Group {}", id),
        priority,
        zone: None,
    }
}

fn table(id: i64, number: i32, capacity: i32) -> SeatingTable {
    SeatingTable {
        id,
        wedding_id: WEDDING_ID,
        table_name: format!("Table {}", number),
        table_number: number,
        capacity,
        table_type: TableType::Mixed,
        assigned_guests: Vec::new(),
        zone: None,
        auto_created: false,
        capacity_override: false,
    }
}

fn apart(id: i64, a: i64, b: i64) -> SeatingPreference {
    SeatingPreference {
        id,
        wedding_id: WEDDING_ID,
        guest_a_id: a,
        guest_b_id: b,
        pref_type: PreferenceType::Apart,
        scope: PreferenceScope::SameTable,
        strength: PreferenceStrength::Must,
        enabled: true,
    }
}

fn wedding_data(guests: Vec<Guest>, tables: Vec<SeatingTable>) -> WeddingData {
    WeddingData {
        wedding: Wedding {
            id: WEDDING_ID,
            name: "Ana & Luis".to_string(),
            event_date: Some("2026-06-20".to_string()),
        },
        settings: SeatingSettings::for_wedding(WEDDING_ID),
        guests,
        groups: Vec::new(),
        tables,
        adjacency: Vec::new(),
        preferences: Vec::new(),
    }
}

fn seed(manager: &SeatingManager, data: &WeddingData) {
    manager.storage().import(data).unwrap();
}

/// Two groups of four single guests, two tables of ten
fn seed_two_groups(manager: &SeatingManager) {
    let guests = (1..=8)
        .map(|id| guest(id, 1, 0, Some(if id <= 4 { 1 } else { 2 })))
        .collect();
    let mut data = wedding_data(guests, vec![table(1, 1, 10), table(2, 2, 10)]);
    data.groups = vec![group(1, 1), group(2, 2)];
    seed(manager, &data);
}

fn update_settings(manager: &SeatingManager, f: impl FnOnce(&mut SeatingSettings)) {
    let mut settings = manager.storage().get_settings(WEDDING_ID).unwrap().unwrap();
    f(&mut settings);
    manager.storage().put_settings(&settings).unwrap();
}

fn real_rows(manager: &SeatingManager) -> Vec<SeatAssignment> {
    manager
        .get_assignments(WEDDING_ID, AssignmentType::Real)
        .unwrap()
}

fn row_of(rows: &[SeatAssignment], guest_id: i64) -> Option<&SeatAssignment> {
    rows.iter().find(|a| a.guest_id == guest_id)
}

/// Every table's cached guest list matches the real partition
fn assert_tables_match_rows(manager: &SeatingManager) {
    let rows = real_rows(manager);
    for t in manager.storage().list_tables(WEDDING_ID).unwrap() {
        let mut expected: Vec<i64> = rows
            .iter()
            .filter(|a| a.table_id == t.id)
            .map(|a| a.guest_id)
            .collect();
        expected.sort_unstable();
        assert_eq!(t.assigned_guests, expected, "table {} out of sync", t.id);
    }
}

mod test_concurrency;
mod test_incremental;
