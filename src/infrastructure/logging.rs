//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - Console and/or file output
//! - Structured JSON logging (optional)
//! - Log files stored relative to executable location
//! - JST (Japan Standard Time) timestamps
//! - Old log cleanup on startup

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::{FixedOffset, Utc};
use lazy_static::lazy_static;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

const JST_OFFSET_SECONDS: i32 = 9 * 3600;

/// Targets that are only shown at TRACE level
const NOISY_TARGETS: &[(&str, &str)] = &[
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("h2", "warn"),
    ("html5ever", "warn"),
    ("selectors", "warn"),
];

/// Custom time formatter for JST (Japan Standard Time, UTC+9)
struct JstTimeFormatter;

impl FormatTime for JstTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let Some(jst) = FixedOffset::east_opt(JST_OFFSET_SECONDS) else {
            return write!(w, "{}", Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"));
        };
        write!(w, "{}", Utc::now().with_timezone(&jst).format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Build the filter from `RUST_LOG`, or from the configured level with
/// dependency noise suppressed unless TRACE is requested.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in NOISY_TARGETS {
            filter = filter.add_directive(format!("{}={}", target, level).parse()?);
        }
    }

    for (module, level) in &config.module_filters {
        filter = filter.add_directive(format!("{}={}", module, level).parse()?);
    }

    Ok(filter)
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LoggingConfig::default())
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG` overrides the configured level and filters entirely:
/// ```bash
/// RUST_LOG="debug,reqwest=debug,hyper=debug" card-buyback refresh
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&config)?;
    let registry = Registry::default().with(env_filter);

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stderr)
            .with_timer(JstTimeFormatter)
            .with_target(false)
    });

    let log_dir = get_log_directory();
    let (json_file_layer, plain_file_layer) = if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        if config.auto_cleanup_logs {
            cleanup_old_logs(&log_dir, config.max_files)?;
        }

        let file_appender = rolling::never(&log_dir, &config.file_name);
        let (file_writer, file_guard) = non_blocking(file_appender);
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);

        if config.json_format {
            let layer = fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(JstTimeFormatter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            (Some(layer), None)
        } else {
            // time + level + message only
            let layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(JstTimeFormatter)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false);
            (None, Some(layer))
        }
    } else {
        (None, None)
    };

    if console_layer.is_none() && !config.file_output {
        return Err(anyhow!("No logging output configured"));
    }

    registry
        .with(console_layer)
        .with(json_file_layer)
        .with(plain_file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log file: {:?}", log_dir.join(&config.file_name));
        info!("JSON format: {}", config.json_format);
    }
    if config.level.to_lowercase().contains("trace") {
        info!("TRACE level active - HTTP and HTML parser logs will be shown");
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== card-buyback System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}

/// Remove the oldest `.log` files beyond `max_files`
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.is_file() && path.extension().is_some_and(|ext| ext == "log");
        if !is_log {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let keep = max_files as usize;
    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            removed += 1;
        }
    }

    if removed > 0 {
        info!("Removed {} old log files (keeping {})", removed, keep);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.file_output);
    }

    #[test]
    fn test_log_directory() {
        let log_dir = get_log_directory();
        assert!(log_dir.to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn test_build_env_filter_with_module_filters() {
        let mut config = LoggingConfig::default();
        assert!(build_env_filter(&config).is_ok());

        config
            .module_filters
            .insert("card_buyback_lib::infrastructure".to_string(), "debug".to_string());
        config.level = "trace".to_string();
        assert!(build_env_filter(&config).is_ok());
    }

    #[test]
    fn test_cleanup_old_logs_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..4 {
            let path = dir.path().join(format!("run-{i}.log"));
            std::fs::write(&path, "x").unwrap();
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let removed = cleanup_old_logs(dir.path(), 2).unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("run-3.log").exists());
        assert!(dir.path().join("run-2.log").exists());
        assert!(!dir.path().join("run-0.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
