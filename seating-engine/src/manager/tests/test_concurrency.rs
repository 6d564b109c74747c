use super::*;
use std::sync::Barrier;

#[test]
fn test_second_run_on_same_partition_is_rejected() {
    let manager = create_test_manager();
    seed_two_groups(&manager);

    let held = manager
        .claim(WEDDING_ID, AssignmentType::Real, "held-run")
        .unwrap();

    let err = manager
        .run_full(WEDDING_ID, AssignmentType::Real)
        .unwrap_err();
    match err {
        ManagerError::RunInProgress {
            wedding_id,
            assignment_type,
            run_id,
        } => {
            assert_eq!(wedding_id, WEDDING_ID);
            assert_eq!(assignment_type, AssignmentType::Real);
            assert_eq!(run_id, "held-run");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Manual edits share the real claim
    assert!(matches!(
        manager.assign_manually(WEDDING_ID, 1, 1, false),
        Err(ManagerError::RunInProgress { .. })
    ));

    // The other partition is independent
    manager
        .run_full(WEDDING_ID, AssignmentType::Simulation)
        .unwrap();

    drop(held);
    assert!(!manager.is_running(WEDDING_ID, AssignmentType::Real));
    manager.run_full(WEDDING_ID, AssignmentType::Real).unwrap();
}

#[test]
fn test_other_weddings_are_not_blocked() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    let mut other_table = table(1, 1, 10);
    other_table.wedding_id = 2;
    let mut other = wedding_data(vec![], vec![other_table]);
    other.wedding.id = 2;
    other.settings.wedding_id = 2;
    seed(&manager, &other);

    let _held = manager
        .claim(WEDDING_ID, AssignmentType::Real, "held-run")
        .unwrap();

    let result = manager.run_full(2, AssignmentType::Real).unwrap();
    assert_eq!(result.assignments_created, 0);
    assert!(result.success);
}

#[test]
fn test_parallel_runs_never_overlap() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                manager.run_full(WEDDING_ID, AssignmentType::Real)
            })
        })
        .collect();

    let mut completed = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(result) => {
                assert_eq!(result.assignments_created, 8);
                completed += 1;
            }
            Err(ManagerError::RunInProgress { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(completed >= 1);
    assert!(!manager.is_running(WEDDING_ID, AssignmentType::Real));
    assert_eq!(real_rows(&manager).len(), 8);
    assert_tables_match_rows(&manager);
}

#[tokio::test]
async fn test_run_with_timeout_broadcasts_result() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    let mut rx = manager.subscribe();

    let result = manager
        .run_with_timeout(
            RunRequest::full(WEDDING_ID, AssignmentType::Real),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(
        event,
        SeatingEvent::RunCompleted {
            wedding_id: WEDDING_ID,
            assignment_type: AssignmentType::Real,
            result,
        }
    );
}

#[tokio::test]
async fn test_manual_edit_broadcasts_change() {
    let manager = create_test_manager();
    seed_two_groups(&manager);
    let mut rx = manager.subscribe();

    manager.assign_manually(WEDDING_ID, 3, 2, false).unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(
        event,
        SeatingEvent::ManualSeatingChanged {
            wedding_id: WEDDING_ID,
            guest_id: 3,
            table_id: Some(2),
        }
    );
}

#[tokio::test]
async fn test_timed_out_run_finishes_in_background() {
    let manager = create_test_manager();
    seed_two_groups(&manager);

    // An open write transaction stalls the run's commit
    let blocker = manager.storage().begin_write().unwrap();

    let err = manager
        .run_with_timeout(
            RunRequest::full(WEDDING_ID, AssignmentType::Real),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::RunTimeout {
            wedding_id: WEDDING_ID,
            timeout_ms: 100,
        }
    ));
    assert!(manager.is_running(WEDDING_ID, AssignmentType::Real));

    drop(blocker);
    for _ in 0..100 {
        if !manager.is_running(WEDDING_ID, AssignmentType::Real) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(!manager.is_running(WEDDING_ID, AssignmentType::Real));
    let logged = manager
        .get_last_run(WEDDING_ID, AssignmentType::Real)
        .unwrap();
    assert!(logged.is_some());
    assert_eq!(real_rows(&manager).len(), 8);
}
