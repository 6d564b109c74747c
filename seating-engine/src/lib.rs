//! Wedding seating engine
//!
//! Places confirmed guest parties onto tables while honouring capacity,
//! must/try together-apart preferences, table adjacency, kids tables and
//! zones. Assignments live in two partitions per wedding: `real` (the
//! live seating) and `simulation` (what-if runs that never touch it).
//!
//! # Module layout
//!
//! ```text
//! seating-engine/src/
//! ├── core/          # Config
//! ├── seating/       # Constraint graph, solver, reconciliation, redb storage
//! ├── manager/       # Run orchestration, manual seating, RSVP hook, events
//! └── utils/         # Logging
//! ```

pub mod core;
pub mod manager;
pub mod seating;
pub mod utils;

pub use crate::core::Config;
pub use manager::{
    ManagerError, ManagerResult, RunRequest, SeatingEvent, SeatingManager,
};
pub use seating::{SeatingStorage, StorageError, WeddingData};
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Re-export unified error types from shared
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Load `.env`, create the working directory and install the logger
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(
        &config.log_level,
        config.is_production(),
        config.log_dir.as_deref(),
    )?;

    Ok(config)
}
