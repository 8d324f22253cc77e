use log::{Level, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use crate::error::Result;

#[derive(Debug)]
struct FileLogger {
    log_path: PathBuf,
    level: Level,
}

static LOGGER: OnceCell<FileLogger> = OnceCell::new();

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            let log_entry = format!("[{}] {} - {}\n", timestamp, record.level(), record.args());
            let log_file = self.log_path.join("log.txt");

            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_file) {
                let _ = file.write_all(log_entry.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

// Installs the file logger under `log_dir`. Debug mode lowers the level to Debug.
pub fn init(log_dir: PathBuf, debug_mode: bool) -> Result<()> {
    create_dir_all(&log_dir)?;

    let level = if debug_mode { Level::Debug } else { Level::Info };
    let logger = LOGGER.get_or_init(|| FileLogger {
        log_path: log_dir,
        level,
    });

    log::set_logger(logger)?;
    log::set_max_level(logger.level.to_level_filter());
    Ok(())
}
