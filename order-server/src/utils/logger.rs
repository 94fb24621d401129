//! Logging Infrastructure
//!
//! Console output plus, when a log directory is given, two daily rotating
//! files:
//! - `app/app.YYYY-MM-DD.log` - everything except the `security` target,
//!   deleted after [`APP_LOG_RETENTION_DAYS`]
//! - `security/security.YYYY-MM-DD.log` - `security` target only, kept forever

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use tracing::Metadata;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

pub const APP_LOG_RETENTION_DAYS: i64 = 14;

const SECURITY_TARGET: &str = "security";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// `RUST_LOG` wins over the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn console_layer(level: &str, json_format: bool) -> BoxedLayer {
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter(level))
            .boxed()
    }
}

fn file_layer(
    dir: &Path,
    prefix: &str,
    level: &str,
    json_format: bool,
    keep: fn(&Metadata<'_>) -> bool,
) -> anyhow::Result<BoxedLayer> {
    fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)?;
    let writer = std::sync::Mutex::new(appender);

    let layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(writer)
            .with_filter(filter_fn(keep))
            .with_filter(env_filter(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter_fn(keep))
            .with_filter(env_filter(level))
            .boxed()
    };
    Ok(layer)
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - default filter when `RUST_LOG` is unset ("info", "debug", ...)
/// * `json_format` - JSON lines instead of the human format
/// * `log_dir` - enables the rotating app/security files
///
/// ```no_run
/// // Development (console only)
/// order_server::init_logger_with_file("debug", false, None)?;
///
/// // Production (console + files)
/// order_server::init_logger_with_file("info", true, Some("./data/logs"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let mut layers = vec![console_layer(level, json_format)];

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);
        layers.push(file_layer(
            &log_dir.join("app"),
            "app",
            level,
            json_format,
            |meta| meta.target() != SECURITY_TARGET,
        )?);
        layers.push(file_layer(
            &log_dir.join(SECURITY_TARGET),
            SECURITY_TARGET,
            level,
            json_format,
            |meta| meta.target() == SECURITY_TARGET,
        )?);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(periodic_cleanup(log_dir.to_path_buf()));
        }
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

/// Initialize the logging system (console only)
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

/// Date stamped into a rotated app log name, `app.YYYY-MM-DD.log`
fn app_log_date(name: &str) -> Option<NaiveDate> {
    let date_part = name.strip_prefix("app.")?.strip_suffix(".log")?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Delete application logs older than [`APP_LOG_RETENTION_DAYS`]
///
/// Security logs are never touched. Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<usize> {
    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Local::now() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);
    let mut removed = 0;

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(date) = app_log_date(name) else {
            continue;
        };
        if let Some(day_start) = Local
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
            && day_start < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            removed += 1;
        }
    }

    Ok(removed)
}

/// Runs every hour
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;

        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_log_date() {
        assert_eq!(
            app_log_date("app.2025-03-01.log"),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(app_log_date("security.2025-03-01.log"), None);
        assert_eq!(app_log_date("app.latest.log"), None);
    }

    #[test]
    fn test_cleanup_removes_only_old_app_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("app");
        let security_dir = dir.path().join("security");
        fs::create_dir_all(&app_dir).unwrap();
        fs::create_dir_all(&security_dir).unwrap();

        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        fs::write(app_dir.join("app.2000-01-01.log"), "old").unwrap();
        fs::write(app_dir.join(format!("app.{today}.log")), "new").unwrap();
        fs::write(security_dir.join("security.2000-01-01.log"), "kept").unwrap();

        assert_eq!(cleanup_old_logs(dir.path()).unwrap(), 1);
        assert!(!app_dir.join("app.2000-01-01.log").exists());
        assert!(app_dir.join(format!("app.{today}.log")).exists());
        assert!(security_dir.join("security.2000-01-01.log").exists());
    }

    #[test]
    fn test_cleanup_without_app_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(dir.path()).unwrap(), 0);
    }
}
