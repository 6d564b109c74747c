//! SeatingManager - run orchestration and manual seating
//!
//! This module handles:
//! - Full and incremental runs for the real and simulation partitions
//! - One active mutating run per (wedding, partition)
//! - Persisting run output in a single redb transaction
//! - Manual assignment with explicit over-capacity confirmation
//! - RSVP-triggered recalculation
//! - Event broadcasting
//!
//! # Run Flow
//!
//! ```text
//! run(request)
//!     ├─ 1. Claim (wedding, partition) or fail with RunInProgress
//!     ├─ 2. Load wedding snapshot (fatal: wedding / settings missing)
//!     ├─ 3. Check mode (real runs need auto mode, simulation must be enabled)
//!     ├─ 4. Build constraint graph
//!     ├─ 5. Solve (full: every cluster; incremental: scope + pins)
//!     ├─ 6. Reconcile tables with the new partition
//!     ├─ 7. Commit transaction
//!     ├─ 8. Broadcast RunCompleted
//!     └─ 9. Release claim, return RunResult
//! ```

mod error;
pub use error::*;

use crate::seating::reconcile::{assignments_from_tables, rebuild_assigned_guests, table_usage};
use crate::seating::{
    ClusterId, ConstraintBuilder, ConstraintGraph, Placement, PlacementSolver, RunCommit,
    RunContext, SeatingStorage, TableAllocator, WeddingData,
};
use crate::utils::logger::RUN_LOG_TARGET;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use shared::models::{
    AssignmentType, AutoRecalcPolicy, ManualAssignResult, RunResult, SeatAssignment, SeatingMode,
    SeatingPlan, SeatingSettings, SeatingTable,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Default event broadcast channel capacity
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// `run(weddingId, type, groupId?)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub wedding_id: i64,
    pub assignment_type: AssignmentType,
    /// Incremental run for this group when set
    #[serde(default)]
    pub group_id: Option<i64>,
}

impl RunRequest {
    pub fn full(wedding_id: i64, assignment_type: AssignmentType) -> Self {
        Self {
            wedding_id,
            assignment_type,
            group_id: None,
        }
    }
}

/// Events published after committed changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatingEvent {
    RunCompleted {
        wedding_id: i64,
        assignment_type: AssignmentType,
        result: RunResult,
    },
    ManualSeatingChanged {
        wedding_id: i64,
        guest_id: i64,
        table_id: Option<i64>,
    },
}

/// What a run re-solves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    All,
    Group(i64),
    Guest(i64),
}

type RunKey = (i64, AssignmentType);

/// Claim on a (wedding, partition); released on drop
struct RunGuard {
    running: Arc<DashMap<RunKey, String>>,
    key: RunKey,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.remove(&self.key);
    }
}

/// SeatingManager for run orchestration
#[derive(Clone)]
pub struct SeatingManager {
    storage: SeatingStorage,
    /// Active runs: (wedding, partition) -> run id
    running: Arc<DashMap<RunKey, String>>,
    event_tx: broadcast::Sender<SeatingEvent>,
}

impl std::fmt::Debug for SeatingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeatingManager")
            .field("storage", &"<SeatingStorage>")
            .field("running", &self.running.len())
            .field("event_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl SeatingManager {
    /// Create a new SeatingManager with the given database path
    pub fn new(db_path: impl AsRef<Path>, event_capacity: usize) -> ManagerResult<Self> {
        let storage = SeatingStorage::open(db_path)?;
        Ok(Self::from_storage(storage, event_capacity))
    }

    fn from_storage(storage: SeatingStorage, event_capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            storage,
            running: Arc::new(DashMap::new()),
            event_tx,
        }
    }

    /// Create a SeatingManager with existing storage (for testing)
    #[cfg(test)]
    pub fn with_storage(storage: SeatingStorage) -> Self {
        Self::from_storage(storage, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    /// Record access for the guest, table, settings and preference surfaces
    pub fn storage(&self) -> &SeatingStorage {
        &self.storage
    }

    /// Subscribe to seating events
    pub fn subscribe(&self) -> broadcast::Receiver<SeatingEvent> {
        self.event_tx.subscribe()
    }

    /// Whether a mutating run currently holds (wedding, partition)
    pub fn is_running(&self, wedding_id: i64, assignment_type: AssignmentType) -> bool {
        self.running.contains_key(&(wedding_id, assignment_type))
    }

    // ========== Runs ==========

    /// Full run without `group_id`, incremental run with it
    pub fn run(&self, request: RunRequest) -> ManagerResult<RunResult> {
        match request.group_id {
            Some(group_id) => {
                self.run_incremental(request.wedding_id, group_id, request.assignment_type)
            }
            None => self.run_full(request.wedding_id, request.assignment_type),
        }
    }

    /// Rebuild constraints and place every confirmed party
    pub fn run_full(
        &self,
        wedding_id: i64,
        assignment_type: AssignmentType,
    ) -> ManagerResult<RunResult> {
        self.execute(wedding_id, assignment_type, Scope::All)
    }

    /// Re-solve one group (and the must-together clusters its parties belong
    /// to); every other real assignment stays pinned
    pub fn run_incremental(
        &self,
        wedding_id: i64,
        group_id: i64,
        assignment_type: AssignmentType,
    ) -> ManagerResult<RunResult> {
        self.execute(wedding_id, assignment_type, Scope::Group(group_id))
    }

    /// Re-solve one guest's must-together cluster
    pub fn run_incremental_for_guest(
        &self,
        wedding_id: i64,
        guest_id: i64,
        assignment_type: AssignmentType,
    ) -> ManagerResult<RunResult> {
        self.execute(wedding_id, assignment_type, Scope::Guest(guest_id))
    }

    /// Run on the blocking pool, giving up after `timeout`
    ///
    /// A timed-out run is not cancelled; it finishes and commits in the
    /// background while its claim stays held.
    pub async fn run_with_timeout(
        &self,
        request: RunRequest,
        timeout: Duration,
    ) -> ManagerResult<RunResult> {
        let manager = self.clone();
        let task = tokio::task::spawn_blocking(move || manager.run(request));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ManagerError::Internal(format!("Run task failed: {}", e))),
            Err(_) => {
                tracing::warn!(
                    wedding_id = request.wedding_id,
                    assignment_type = %request.assignment_type,
                    timeout_ms = timeout.as_millis() as u64,
                    "Seating run timed out"
                );
                Err(ManagerError::RunTimeout {
                    wedding_id: request.wedding_id,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    fn execute(
        &self,
        wedding_id: i64,
        assignment_type: AssignmentType,
        scope: Scope,
    ) -> ManagerResult<RunResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let _guard = self.claim(wedding_id, assignment_type, &run_id)?;

        let data = self.storage.load_wedding_data(wedding_id)?;
        check_run_allowed(&data.settings, wedding_id, assignment_type)?;

        let mut ctx = RunContext::new(
            run_id.clone(),
            wedding_id,
            assignment_type,
            data.settings.clone(),
        );
        let graph = ConstraintBuilder::new(&data.guests, &data.groups, &data.preferences)
            .build(&mut ctx);

        let (placement, commit) = match scope {
            Scope::All => self.plan_full(&data, &graph, &mut ctx)?,
            Scope::Group(_) | Scope::Guest(_) => {
                self.plan_incremental(&data, &graph, &mut ctx, scope)?
            }
        };

        let result = RunResult {
            run_id,
            success: placement.unplaced_guest_ids.is_empty(),
            assignments_created: placement.assignments.len(),
            tables_created: placement.new_tables.len(),
            conflicts: ctx.conflicts.into_conflicts(),
            unplaced_guest_ids: placement.unplaced_guest_ids,
        };

        self.storage.commit_run(&RunCommit {
            run_result: Some(result.clone()),
            ..commit
        })?;

        tracing::info!(
            target: RUN_LOG_TARGET,
            wedding_id,
            assignment_type = %assignment_type,
            scope = ?scope,
            run_id = %result.run_id,
            assignments = result.assignments_created,
            tables_created = result.tables_created,
            conflicts = result.conflicts.len(),
            unplaced = result.unplaced_guest_ids.len(),
            "Seating run completed"
        );

        let event = SeatingEvent::RunCompleted {
            wedding_id,
            assignment_type,
            result: result.clone(),
        };
        if self.event_tx.send(event).is_err() {
            tracing::debug!("No subscribers for seating events");
        }

        Ok(result)
    }

    fn plan_full(
        &self,
        data: &WeddingData,
        graph: &ConstraintGraph,
        ctx: &mut RunContext,
    ) -> ManagerResult<(Placement, RunCommit)> {
        // Solver-opened tables are rebuilt from scratch on every full run
        let (kept, auto): (Vec<SeatingTable>, Vec<SeatingTable>) =
            data.tables.iter().cloned().partition(|t| !t.auto_created);

        let reused = match ctx.assignment_type {
            AssignmentType::Real => &kept,
            AssignmentType::Simulation => &data.tables,
        };
        let allocator = self.allocator_for(ctx, reused)?;
        let solver =
            PlacementSolver::new(graph, &ctx.settings, kept.clone(), &data.adjacency, allocator);
        let placement = solver.solve(ctx, None, &[]);

        let commit = match ctx.assignment_type {
            AssignmentType::Real => {
                let mut tables: Vec<SeatingTable> =
                    kept.into_iter().chain(placement.new_tables.clone()).collect();
                rebuild_assigned_guests(&mut tables, &placement.assignments);
                refresh_capacity_override(&mut tables, &placement.assignments);
                RunCommit {
                    wedding_id: ctx.wedding_id,
                    assignment_type: AssignmentType::Real,
                    assignments: placement.assignments.clone(),
                    upsert_tables: tables,
                    remove_table_ids: auto.iter().map(|t| t.id).collect(),
                    simulated_tables: None,
                    run_result: None,
                }
            }
            AssignmentType::Simulation => {
                let mut simulated = placement.new_tables.clone();
                rebuild_assigned_guests(&mut simulated, &placement.assignments);
                RunCommit {
                    wedding_id: ctx.wedding_id,
                    assignment_type: AssignmentType::Simulation,
                    assignments: placement.assignments.clone(),
                    upsert_tables: Vec::new(),
                    remove_table_ids: Vec::new(),
                    simulated_tables: Some(simulated),
                    run_result: None,
                }
            }
        };

        Ok((placement, commit))
    }

    /// Allocator for tables a run opens
    ///
    /// Real runs allocate above the simulated tables as well.
    fn allocator_for(
        &self,
        ctx: &RunContext,
        tables: &[SeatingTable],
    ) -> ManagerResult<TableAllocator> {
        match ctx.assignment_type {
            AssignmentType::Real => {
                let simulated = self.storage.get_simulated_tables(ctx.wedding_id)?;
                Ok(TableAllocator::after(tables.iter().chain(&simulated)))
            }
            AssignmentType::Simulation => Ok(TableAllocator::after(tables)),
        }
    }

    fn plan_incremental(
        &self,
        data: &WeddingData,
        graph: &ConstraintGraph,
        ctx: &mut RunContext,
        scope: Scope,
    ) -> ManagerResult<(Placement, RunCommit)> {
        let scope_guests: HashSet<i64> = match scope {
            Scope::Group(group_id) => {
                if data.group(group_id).is_none() {
                    return Err(ManagerError::GroupNotFound(group_id));
                }
                data.guests
                    .iter()
                    .filter(|g| g.group_id == Some(group_id))
                    .map(|g| g.id)
                    .collect()
            }
            Scope::Guest(guest_id) => {
                if data.guest(guest_id).is_none() {
                    return Err(ManagerError::GuestNotFound(guest_id));
                }
                HashSet::from([guest_id])
            }
            Scope::All => data.guests.iter().map(|g| g.id).collect(),
        };

        let clusters: HashSet<ClusterId> = scope_guests
            .iter()
            .filter_map(|&g| graph.cluster_of(g))
            .collect();
        let mut affected = scope_guests;
        for &c in &clusters {
            affected.extend(graph.cluster(c).guest_ids());
        }

        let pins: Vec<SeatAssignment> = self
            .storage
            .get_assignments(ctx.wedding_id, AssignmentType::Real)?
            .into_iter()
            .filter(|a| !affected.contains(&a.guest_id))
            .map(|a| SeatAssignment {
                assignment_type: ctx.assignment_type,
                ..a
            })
            .collect();

        let solver = PlacementSolver::new(
            graph,
            &ctx.settings,
            data.tables.clone(),
            &data.adjacency,
            self.allocator_for(ctx, &data.tables)?,
        );
        let placement = solver.solve(ctx, Some(&clusters), &pins);

        let mut partition: Vec<SeatAssignment> = pins
            .into_iter()
            .chain(placement.assignments.iter().cloned())
            .collect();
        partition.sort_by_key(|a| (a.table_id, a.guest_id));

        let commit = match ctx.assignment_type {
            AssignmentType::Real => {
                let mut tables: Vec<SeatingTable> = data
                    .tables
                    .iter()
                    .cloned()
                    .chain(placement.new_tables.clone())
                    .collect();
                rebuild_assigned_guests(&mut tables, &partition);
                refresh_capacity_override(&mut tables, &partition);

                // Drop solver-opened tables this run emptied
                let (remove, keep): (Vec<SeatingTable>, Vec<SeatingTable>) = tables
                    .into_iter()
                    .partition(|t| t.auto_created && t.assigned_guests.is_empty());
                let upsert = keep
                    .into_iter()
                    .filter(|t| data.table(t.id) != Some(t))
                    .collect();

                RunCommit {
                    wedding_id: ctx.wedding_id,
                    assignment_type: AssignmentType::Real,
                    assignments: partition,
                    upsert_tables: upsert,
                    remove_table_ids: remove.iter().map(|t| t.id).collect(),
                    simulated_tables: None,
                    run_result: None,
                }
            }
            AssignmentType::Simulation => {
                let mut simulated = placement.new_tables.clone();
                rebuild_assigned_guests(&mut simulated, &partition);
                RunCommit {
                    wedding_id: ctx.wedding_id,
                    assignment_type: AssignmentType::Simulation,
                    assignments: partition,
                    upsert_tables: Vec::new(),
                    remove_table_ids: Vec::new(),
                    simulated_tables: Some(simulated),
                    run_result: None,
                }
            }
        };

        Ok((placement, commit))
    }

    fn claim(
        &self,
        wedding_id: i64,
        assignment_type: AssignmentType,
        run_id: &str,
    ) -> ManagerResult<RunGuard> {
        let key = (wedding_id, assignment_type);
        match self.running.entry(key) {
            Entry::Occupied(entry) => {
                tracing::warn!(
                    wedding_id,
                    assignment_type = %assignment_type,
                    active_run = %entry.get(),
                    "Run rejected: another run is in progress"
                );
                Err(ManagerError::RunInProgress {
                    wedding_id,
                    assignment_type,
                    run_id: entry.get().clone(),
                })
            }
            Entry::Vacant(entry) => {
                entry.insert(run_id.to_string());
                Ok(RunGuard {
                    running: self.running.clone(),
                    key,
                })
            }
        }
    }

    // ========== Queries ==========

    /// Read-only projection of one partition
    pub fn get_assignments(
        &self,
        wedding_id: i64,
        assignment_type: AssignmentType,
    ) -> ManagerResult<Vec<SeatAssignment>> {
        if self.storage.get_wedding(wedding_id)?.is_none() {
            return Err(ManagerError::WeddingNotFound(wedding_id));
        }
        Ok(self.storage.get_assignments(wedding_id, assignment_type)?)
    }

    /// Tables with their guests as one partition sees them
    ///
    /// The simulation view adds simulated tables and lists simulated guests
    /// on copies of the real tables.
    pub fn get_plan(
        &self,
        wedding_id: i64,
        assignment_type: AssignmentType,
    ) -> ManagerResult<SeatingPlan> {
        let assignments = self.get_assignments(wedding_id, assignment_type)?;
        let mut tables = self.storage.list_tables(wedding_id)?;
        if assignment_type == AssignmentType::Simulation {
            tables.extend(self.storage.get_simulated_tables(wedding_id)?);
            rebuild_assigned_guests(&mut tables, &assignments);
        }
        tables.sort_by_key(|t| (t.table_number, t.id));
        Ok(SeatingPlan {
            tables,
            assignments,
        })
    }

    pub fn get_last_run(
        &self,
        wedding_id: i64,
        assignment_type: AssignmentType,
    ) -> ManagerResult<Option<RunResult>> {
        Ok(self.storage.get_last_run(wedding_id, assignment_type)?)
    }

    // ========== Manual seating ==========

    /// Seat a guest at a table, bypassing the solver
    ///
    /// Exceeding capacity needs `allow_over_capacity`; the table is then
    /// flagged `capacity_override` and the result reports `over_capacity`.
    pub fn assign_manually(
        &self,
        wedding_id: i64,
        guest_id: i64,
        table_id: i64,
        allow_over_capacity: bool,
    ) -> ManagerResult<ManualAssignResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let _guard = self.claim(wedding_id, AssignmentType::Real, &run_id)?;

        let data = self.storage.load_wedding_data(wedding_id)?;
        let guest = data
            .guest(guest_id)
            .ok_or(ManagerError::GuestNotFound(guest_id))?;
        let table = data
            .table(table_id)
            .ok_or(ManagerError::TableNotFound(table_id))?;

        let mut rows = self.current_real_rows(&data)?;
        rows.retain(|a| a.guest_id != guest_id);

        let seats_used = table_usage(&rows).get(&table_id).copied().unwrap_or(0)
            + guest.seat_weight();
        let over_capacity = seats_used > table.capacity;
        if over_capacity && !allow_over_capacity {
            return Err(ManagerError::TableCapacityExceeded {
                table_id,
                capacity: table.capacity,
                requested: seats_used,
            });
        }

        rows.push(SeatAssignment {
            wedding_id,
            table_id,
            guest_id,
            seats_count: guest.seat_weight(),
            assignment_type: AssignmentType::Real,
        });
        self.commit_manual(&data, rows)?;

        tracing::info!(
            wedding_id,
            guest_id,
            table_id,
            seats_used,
            over_capacity,
            "Guest assigned manually"
        );
        let event = SeatingEvent::ManualSeatingChanged {
            wedding_id,
            guest_id,
            table_id: Some(table_id),
        };
        if self.event_tx.send(event).is_err() {
            tracing::debug!("No subscribers for seating events");
        }

        Ok(ManualAssignResult {
            table_id,
            seats_used,
            over_capacity,
        })
    }

    /// Unseat a guest; returns false if the guest had no real seat
    pub fn remove_assignment(&self, wedding_id: i64, guest_id: i64) -> ManagerResult<bool> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let _guard = self.claim(wedding_id, AssignmentType::Real, &run_id)?;

        let data = self.storage.load_wedding_data(wedding_id)?;
        let mut rows = self.current_real_rows(&data)?;
        let before = rows.len();
        rows.retain(|a| a.guest_id != guest_id);
        if rows.len() == before {
            return Ok(false);
        }
        self.commit_manual(&data, rows)?;

        tracing::info!(wedding_id, guest_id, "Manual assignment removed");
        let event = SeatingEvent::ManualSeatingChanged {
            wedding_id,
            guest_id,
            table_id: None,
        };
        if self.event_tx.send(event).is_err() {
            tracing::debug!("No subscribers for seating events");
        }
        Ok(true)
    }

    /// Authoritative real seating for the wedding's mode
    fn current_real_rows(&self, data: &WeddingData) -> ManagerResult<Vec<SeatAssignment>> {
        Ok(match data.settings.mode {
            SeatingMode::Manual => assignments_from_tables(data.wedding.id, &data.tables, &data.guests),
            SeatingMode::Auto => self
                .storage
                .get_assignments(data.wedding.id, AssignmentType::Real)?,
        })
    }

    /// Write the real partition and the tables' guest lists together
    fn commit_manual(&self, data: &WeddingData, mut rows: Vec<SeatAssignment>) -> ManagerResult<()> {
        rows.sort_by_key(|a| (a.table_id, a.guest_id));

        let mut tables = data.tables.clone();
        rebuild_assigned_guests(&mut tables, &rows);
        refresh_capacity_override(&mut tables, &rows);
        let changed = tables
            .into_iter()
            .filter(|t| data.table(t.id) != Some(t))
            .collect();

        self.storage.commit_run(&RunCommit {
            wedding_id: data.wedding.id,
            assignment_type: AssignmentType::Real,
            assignments: rows,
            upsert_tables: changed,
            remove_table_ids: Vec::new(),
            simulated_tables: None,
            run_result: None,
        })?;
        Ok(())
    }

    // ========== RSVP hook ==========

    /// React to a guest's RSVP change according to the wedding's policy
    ///
    /// Returns the run result when a real run was triggered.
    pub fn on_rsvp_changed(
        &self,
        wedding_id: i64,
        guest_id: i64,
    ) -> ManagerResult<Option<RunResult>> {
        let settings = self
            .storage
            .get_settings(wedding_id)?
            .ok_or(crate::seating::StorageError::SettingsMissing(wedding_id))?;

        if settings.mode == SeatingMode::Manual {
            tracing::debug!(wedding_id, guest_id, "RSVP change ignored in manual mode");
            return Ok(None);
        }

        match settings.auto_recalc_policy {
            AutoRecalcPolicy::ManualTriggerOnly => {
                tracing::debug!(wedding_id, guest_id, "RSVP change waits for a manual run");
                Ok(None)
            }
            AutoRecalcPolicy::Full => self.run_full(wedding_id, AssignmentType::Real).map(Some),
            AutoRecalcPolicy::OnRsvpChangeGroupOnly => {
                let guest = self
                    .storage
                    .get_guest(wedding_id, guest_id)?
                    .ok_or(ManagerError::GuestNotFound(guest_id))?;
                let group = match guest.group_id {
                    Some(group_id) => self.storage.get_group(wedding_id, group_id)?,
                    None => None,
                };
                let result = match group {
                    Some(group) => {
                        self.run_incremental(wedding_id, group.id, AssignmentType::Real)?
                    }
                    None => {
                        self.run_incremental_for_guest(wedding_id, guest_id, AssignmentType::Real)?
                    }
                };
                Ok(Some(result))
            }
        }
    }
}

fn check_run_allowed(
    settings: &SeatingSettings,
    wedding_id: i64,
    assignment_type: AssignmentType,
) -> ManagerResult<()> {
    match assignment_type {
        AssignmentType::Real if settings.mode == SeatingMode::Manual => {
            Err(ManagerError::ManualModeActive(wedding_id))
        }
        AssignmentType::Simulation if !settings.simulation_enabled => {
            Err(ManagerError::SimulationDisabled(wedding_id))
        }
        _ => Ok(()),
    }
}

/// Clear `capacity_override` on tables back within capacity
fn refresh_capacity_override(tables: &mut [SeatingTable], rows: &[SeatAssignment]) {
    let usage = table_usage(rows);
    for table in tables.iter_mut() {
        let used = usage.get(&table.id).copied().unwrap_or(0);
        table.capacity_override = used > table.capacity;
    }
}

#[cfg(test)]
mod tests;
