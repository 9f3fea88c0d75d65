use anyhow::{Context, Result};
use log::{error, info, warn};
use std::fs;
use std::path::Path;

use crate::config::LoggingConfig;

fn dispatch(level: log::LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
}

/// Installs the global logger: stdout plus the configured log file. If the
/// file cannot be opened, logs go to stdout only.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    match fern::log_file(&config.file) {
        Ok(file) => {
            dispatch(log::LevelFilter::Debug)
                .chain(file)
                .apply()
                .context("Failed to install logger")?;
        }
        Err(e) => {
            dispatch(log::LevelFilter::Debug)
                .apply()
                .context("Failed to install logger")?;
            warn!("Cannot open log file {}: {}, logging to stdout only", config.file, e);
        }
    }
    trim_log(Path::new(&config.file), config.max_lines);
    Ok(())
}

/// Keeps only the last `max_lines` lines of the log file.
pub fn trim_log(log_path: &Path, max_lines: usize) {
    let Ok(content) = fs::read_to_string(log_path) else {
        warn!("Log file not found for trimming");
        return;
    };
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() > max_lines {
        let start = lines.len() - max_lines;
        let trimmed = lines[start..].join("\n");
        if fs::write(log_path, trimmed + "\n").is_ok() {
            info!("Trimmed log file to {} lines", max_lines);
        } else {
            error!("Failed to trim log file");
        }
    }
}
