use std::path::PathBuf;
use std::time::Duration;

/// Seating engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | ./work_dir | Working directory (database, logs) |
/// | SEATING_DB_FILE | seating.redb | Database file name under WORK_DIR |
/// | LOG_LEVEL | info | Log level when RUST_LOG is unset |
/// | LOG_DIR | (none) | Enables file logging when set |
/// | RUN_TIMEOUT_MS | 30000 | Upper bound for one run |
/// | EVENT_CHANNEL_CAPACITY | 256 | Seating event broadcast buffer |
/// | ENVIRONMENT | development | development \| staging \| production |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/seating RUN_TIMEOUT_MS=5000 seating-engine wedding.json
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub db_file: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub run_timeout_ms: u64,
    pub event_channel_capacity: usize,
    pub environment: String,
}

impl Config {
    /// Load from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            db_file: std::env::var("SEATING_DB_FILE").unwrap_or_else(|_| "seating.redb".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            run_timeout_ms: std::env::var("RUN_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(crate::manager::DEFAULT_EVENT_CHANNEL_CAPACITY),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the working directory and run timeout
    ///
    /// Used by tests
    pub fn with_overrides(work_dir: impl Into<String>, run_timeout_ms: u64) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.run_timeout_ms = run_timeout_ms;
        config
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
