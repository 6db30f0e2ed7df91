//! Tracing subscriber setup: console output plus a dated log file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::config::LogConfig;

/// Install the global subscriber.
///
/// Returns the path of the log file lines are appended to.
pub fn init(config: &LogConfig) -> anyhow::Result<PathBuf> {
    let (path, file) = open_log_file(&config.directory)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(path)
}

fn open_log_file(directory: &Path) -> std::io::Result<(PathBuf, File)> {
    fs::create_dir_all(directory)?;
    let path = directory.join(log_file_name(&Local::now().date_naive()));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

fn log_file_name(date: &chrono::NaiveDate) -> String {
    format!("{}.log", date.format("%Y-%m-%d"))
}
