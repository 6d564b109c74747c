use crate::seating::StorageError;
use shared::error::{AppError, ErrorCode};
use shared::models::AssignmentType;
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Wedding not found: {0}")]
    WeddingNotFound(i64),

    #[error("Guest not found: {0}")]
    GuestNotFound(i64),

    #[error("Guest group not found: {0}")]
    GroupNotFound(i64),

    #[error("Table not found: {0}")]
    TableNotFound(i64),

    #[error("A {assignment_type} run is already in progress for wedding {wedding_id} ({run_id})")]
    RunInProgress {
        wedding_id: i64,
        assignment_type: AssignmentType,
        run_id: String,
    },

    #[error("Wedding {0} is in manual seating mode")]
    ManualModeActive(i64),

    #[error("Simulation runs are disabled for wedding {0}")]
    SimulationDisabled(i64),

    #[error("Table {table_id} seats {capacity}, assignment needs {requested}")]
    TableCapacityExceeded {
        table_id: i64,
        capacity: i32,
        requested: i32,
    },

    #[error("Run for wedding {wedding_id} exceeded {timeout_ms}ms")]
    RunTimeout { wedding_id: i64, timeout_ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map a storage error onto an error code
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::WeddingNotFound(_) => ErrorCode::WeddingNotFound,
        StorageError::SettingsMissing(_) => ErrorCode::SettingsMissing,
        StorageError::GuestNotFound(_) => ErrorCode::GuestNotFound,
        StorageError::TableNotFound(_) => ErrorCode::TableNotFound,
        StorageError::GuestHasAssignments(_) => ErrorCode::GuestHasAssignments,
        StorageError::TableHasAssignments(_) => ErrorCode::TableHasAssignments,
        StorageError::TableNumberExists(_) => ErrorCode::TableNumberExists,
        StorageError::Serialization(_) => ErrorCode::InternalError,
        // redb: Database/Transaction/Table/Storage/Commit
        _ => ErrorCode::DatabaseError,
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                if code == ErrorCode::DatabaseError {
                    tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                }
                AppError::with_message(code, e.to_string())
            }
            ManagerError::RunInProgress {
                wedding_id,
                assignment_type,
                run_id,
            } => AppError::run_in_progress(wedding_id, assignment_type.as_str())
                .with_detail("run_id", run_id),
            ManagerError::TableCapacityExceeded {
                table_id,
                capacity,
                requested,
            } => AppError::with_message(
                ErrorCode::TableCapacityExceeded,
                format!(
                    "Table {} seats {}, assignment needs {}",
                    table_id, capacity, requested
                ),
            )
            .with_detail("table_id", table_id)
            .with_detail("capacity", capacity)
            .with_detail("requested", requested),
            ManagerError::RunTimeout {
                wedding_id,
                timeout_ms,
            } => AppError::with_message(
                ErrorCode::RunTimeout,
                format!("Run for wedding {} exceeded {}ms", wedding_id, timeout_ms),
            )
            .with_detail("wedding_id", wedding_id),
            other => {
                let code = match &other {
                    ManagerError::WeddingNotFound(_) => ErrorCode::WeddingNotFound,
                    ManagerError::GuestNotFound(_) => ErrorCode::GuestNotFound,
                    ManagerError::GroupNotFound(_) => ErrorCode::GroupNotFound,
                    ManagerError::TableNotFound(_) => ErrorCode::TableNotFound,
                    ManagerError::ManualModeActive(_) => ErrorCode::ManualModeActive,
                    ManagerError::SimulationDisabled(_) => ErrorCode::SimulationDisabled,
                    _ => ErrorCode::InternalError,
                };
                AppError::with_message(code, other.to_string())
            }
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
