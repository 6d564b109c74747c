use super::*;

fn rows_outside(rows: &[SeatAssignment], guests: &[i64]) -> Vec<SeatAssignment> {
    rows.iter()
        .filter(|a| !guests.contains(&a.guest_id))
        .cloned()
        .collect()
}

#[test]
fn test_incremental_places_new_guest_and_pins_others() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    manager.run_full(WEDDING_ID, AssignmentType::Real).unwrap();
    let before = real_rows(&manager);

    manager.storage().put_guest(&guest(9, 2, 0, Some(1))).unwrap();
    let result = manager
        .run_incremental(WEDDING_ID, 1, AssignmentType::Real)
        .unwrap();

    assert!(result.success);
    assert_eq!(result.assignments_created, 5);
    let after = real_rows(&manager);
    assert_eq!(after.len(), 9);
    assert_eq!(row_of(&after, 9).unwrap().seats_count, 2);
    assert_eq!(
        rows_outside(&after, &[1, 2, 3, 4, 9]),
        rows_outside(&before, &[1, 2, 3, 4])
    );
    assert_tables_match_rows(&manager);
}

#[test]
fn test_run_request_with_group_is_incremental() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    manager.run_full(WEDDING_ID, AssignmentType::Real).unwrap();

    let result = manager
        .run(RunRequest {
            wedding_id: WEDDING_ID,
            assignment_type: AssignmentType::Real,
            group_id: Some(2),
        })
        .unwrap();

    assert_eq!(result.assignments_created, 4);
    assert_eq!(real_rows(&manager).len(), 8);
}

#[test]
fn test_incremental_unknown_group() {
    let manager = create_test_manager();
    seed_two_groups(&manager);

    let err = manager
        .run_incremental(WEDDING_ID, 42, AssignmentType::Real)
        .unwrap_err();

    assert!(matches!(err, ManagerError::GroupNotFound(42)));
    assert!(!manager.is_running(WEDDING_ID, AssignmentType::Real));
    assert!(real_rows(&manager).is_empty());
}

#[test]
fn test_incremental_respects_pinned_apart_partner() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    manager.run_full(WEDDING_ID, AssignmentType::Real).unwrap();
    let pinned_table = row_of(&real_rows(&manager), 5).unwrap().table_id;

    manager.storage().put_guest(&guest(9, 1, 0, Some(1))).unwrap();
    manager.storage().put_preference(&apart(1, 9, 5)).unwrap();
    manager
        .run_incremental(WEDDING_ID, 1, AssignmentType::Real)
        .unwrap();

    let rows = real_rows(&manager);
    assert_eq!(row_of(&rows, 5).unwrap().table_id, pinned_table);
    assert_ne!(row_of(&rows, 9).unwrap().table_id, pinned_table);
}

#[test]
fn test_rsvp_decline_unseats_guest() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    manager.run_full(WEDDING_ID, AssignmentType::Real).unwrap();
    let before = real_rows(&manager);

    let mut declined = guest(2, 1, 0, Some(1));
    declined.rsvp_status = RsvpStatus::Declined;
    manager.storage().put_guest(&declined).unwrap();

    let result = manager.on_rsvp_changed(WEDDING_ID, 2).unwrap().unwrap();

    assert!(result.success);
    let after = real_rows(&manager);
    assert!(row_of(&after, 2).is_none());
    assert_eq!(after.len(), 7);
    assert_eq!(
        rows_outside(&after, &[1, 2, 3, 4]),
        rows_outside(&before, &[1, 2, 3, 4])
    );
    assert_tables_match_rows(&manager);
}

#[test]
fn test_rsvp_for_ungrouped_guest_resolves_only_that_guest() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    manager.storage().put_guest(&guest(9, 1, 0, None)).unwrap();
    manager.run_full(WEDDING_ID, AssignmentType::Real).unwrap();
    let before = real_rows(&manager);

    manager.storage().put_guest(&guest(9, 3, 1, None)).unwrap();
    let result = manager.on_rsvp_changed(WEDDING_ID, 9).unwrap().unwrap();

    assert_eq!(result.assignments_created, 1);
    let after = real_rows(&manager);
    assert_eq!(row_of(&after, 9).unwrap().seats_count, 4);
    assert_eq!(rows_outside(&after, &[9]), rows_outside(&before, &[9]));
}

#[test]
fn test_rsvp_manual_trigger_only_does_nothing() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    update_settings(&manager, |s| {
        s.auto_recalc_policy = AutoRecalcPolicy::ManualTriggerOnly
    });

    assert_eq!(manager.on_rsvp_changed(WEDDING_ID, 1).unwrap(), None);
    assert!(real_rows(&manager).is_empty());
    assert!(
        manager
            .get_last_run(WEDDING_ID, AssignmentType::Real)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_rsvp_full_policy_reruns_everything() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    update_settings(&manager, |s| s.auto_recalc_policy = AutoRecalcPolicy::Full);

    let result = manager.on_rsvp_changed(WEDDING_ID, 1).unwrap().unwrap();

    assert_eq!(result.assignments_created, 8);
    assert_eq!(real_rows(&manager).len(), 8);
}

#[test]
fn test_rsvp_ignored_in_manual_mode() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    update_settings(&manager, |s| s.mode = SeatingMode::Manual);

    assert_eq!(manager.on_rsvp_changed(WEDDING_ID, 1).unwrap(), None);
}

#[test]
fn test_incremental_drops_emptied_auto_table() {
    let manager = create_test_manager();
    let guests = (1..=12)
        .map(|id| guest(id, 1, 0, Some(if id <= 10 { 1 } else { 2 })))
        .collect();
    let mut data = wedding_data(guests, vec![table(1, 1, 10)]);
    data.groups = vec![group(1, 1), group(2, 2)];
    seed(&manager, &data);

    let first = manager.run_full(WEDDING_ID, AssignmentType::Real).unwrap();
    assert_eq!(first.tables_created, 1);
    assert_eq!(manager.storage().list_tables(WEDDING_ID).unwrap().len(), 2);

    for id in [11, 12] {
        let mut g = guest(id, 1, 0, Some(2));
        g.rsvp_status = RsvpStatus::Declined;
        manager.storage().put_guest(&g).unwrap();
    }
    manager.on_rsvp_changed(WEDDING_ID, 11).unwrap();

    let tables = manager.storage().list_tables(WEDDING_ID).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].id, 1);
    assert_eq!(tables[0].assigned_guests.len(), 10);
    assert_eq!(real_rows(&manager).len(), 10);
}

#[test]
fn test_simulation_incremental_keeps_real_partition() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    manager.run_full(WEDDING_ID, AssignmentType::Real).unwrap();
    let real_before = real_rows(&manager);

    manager.storage().put_guest(&guest(9, 1, 0, Some(2))).unwrap();
    let result = manager
        .run_incremental(WEDDING_ID, 2, AssignmentType::Simulation)
        .unwrap();

    assert_eq!(result.assignments_created, 5);
    assert_eq!(real_rows(&manager), real_before);

    let simulated = manager
        .get_assignments(WEDDING_ID, AssignmentType::Simulation)
        .unwrap();
    assert_eq!(simulated.len(), 9);
    assert!(
        simulated
            .iter()
            .all(|a| a.assignment_type == AssignmentType::Simulation)
    );
    // Pinned groups mirror their real seats
    for real in real_before.iter().filter(|a| a.guest_id <= 4) {
        assert_eq!(row_of(&simulated, real.guest_id).unwrap().table_id, real.table_id);
    }
}
