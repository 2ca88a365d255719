// File-backed `log` sink. The terminal belongs to the TUI, so records go
// to `<state dir>/recorder.log` instead of stderr.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "[{} {:<5} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Level from `RECORDER_LOG` (error/warn/info/debug/trace/off), default info.
pub fn level_from_env() -> LevelFilter {
    std::env::var("RECORDER_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Installs the global logger. Returns the log file path.
pub fn init(dir: &Path, level: LevelFilter) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("recorder.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    log::set_boxed_logger(Box::new(FileLogger { file: Mutex::new(file), level }))?;
    log::set_max_level(level);
    Ok(path)
}
