//! Logging Infrastructure
//!
//! Structured logging for the seating engine:
//! - Console output, pretty in development and JSON in production
//! - Optional daily rotating application logs under `<log_dir>/app`
//! - Run completion records (target `seating_run`) under `<log_dir>/runs`,
//!   never deleted

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

/// Target used for the per-run log lines kept in `runs/`
pub const RUN_LOG_TARGET: &str = "seating_run";

/// Days an application log file is kept
pub const APP_LOG_RETENTION_DAYS: i64 = 14;

/// Delete `app-YYYY-MM-DD.log` files older than `retention_days`
///
/// Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> anyhow::Result<usize> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(retention_days);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(date_part) = name.strip_prefix("app-").and_then(|d| d.strip_suffix(".log"))
            && let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            removed += 1;
        }
    }

    Ok(removed)
}

/// Initialize console-only logging at `info`
pub fn init_logger() -> anyhow::Result<()> {
    init_logger_with_file("info", false, None)
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug", "warn"); `RUST_LOG` wins when set
/// * `json_format` - JSON console output (production)
/// * `log_dir` - Optional directory for file logging
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let Some(dir) = log_dir else {
        subscriber
            .with(console_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
        return Ok(());
    };

    let log_dir = Path::new(dir);
    let app_log_dir = log_dir.join("app");
    let run_log_dir = log_dir.join("runs");
    fs::create_dir_all(&app_log_dir)?;
    fs::create_dir_all(&run_log_dir)?;

    if let Err(e) = cleanup_old_logs(log_dir, APP_LOG_RETENTION_DAYS) {
        eprintln!("Log cleanup failed: {}", e);
    }

    // Application logs, everything except run records
    let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
    let app_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(app_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() != RUN_LOG_TARGET
        }));

    let run_log = RollingFileAppender::new(Rotation::DAILY, run_log_dir, "runs");
    let run_layer = fmt::layer()
        .json()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(run_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() == RUN_LOG_TARGET
        }));

    subscriber
        .with(console_layer)
        .with(app_layer)
        .with(run_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_only_expired_app_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(&app).unwrap();

        let today = chrono::Local::now().date_naive();
        let old = today - chrono::Duration::days(30);
        let old_name = format!("app-{}.log", old.format("%Y-%m-%d"));
        let fresh_name = format!("app-{}.log", today.format("%Y-%m-%d"));
        fs::write(app.join(&old_name), "old").unwrap();
        fs::write(app.join(&fresh_name), "fresh").unwrap();
        fs::write(app.join("notes.txt"), "keep").unwrap();

        let removed = cleanup_old_logs(dir.path(), APP_LOG_RETENTION_DAYS).unwrap();

        assert_eq!(removed, 1);
        assert!(!app.join(old_name).exists());
        assert!(app.join(fresh_name).exists());
        assert!(app.join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_without_app_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(dir.path(), 7).unwrap(), 0);
    }
}
