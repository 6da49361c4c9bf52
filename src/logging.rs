//! File + stdout tracing setup for binaries and demos.
//!
//! Bevy's `LogPlugin` must be disabled when this is used, since both install a
//! global subscriber.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "terragami";
const DEFAULT_FILTER: &str = "bevy_ecs=info,terragami=info";

/// Install a subscriber writing to `logs/terragami_<timestamp>.log` and
/// stdout, keeping the newest `keep_count` log files. Returns the log path.
pub fn setup_file_logging(log_dir: impl AsRef<Path>, keep_count: usize) -> io::Result<PathBuf> {
    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir)?;
    cleanup_old_logs(log_dir, keep_count);

    let now = chrono::Local::now();
    let log_filename = format!("{}_{}.log", LOG_PREFIX, now.format("%Y%m%d_%H%M%S"));
    let log_file_path = log_dir.join(&log_filename);

    // One file per run, never rotated.
    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, &log_filename);
    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_file_path)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with(LOG_PREFIX) && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}
