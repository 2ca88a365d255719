use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{LogEntry, LogForm};

pub const LOG_HEADERS: [&str; 3] = ["期日", "任务", "备注"];
pub const DEFAULT_LOG_FILE: &str = "blogs.csv";

const UTF8_BOM: &str = "\u{feff}";

/// Rows read back from the work-log file.
#[derive(Debug, Default)]
pub struct LogTable {
    pub entries: Vec<LogEntry>,
    pub file_missing: bool,
    pub header_mismatch: bool,
}

/// Append-only CSV store for work-log entries.
pub struct WorkLogStore {
    path: PathBuf,
}

impl WorkLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WorkLogStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file with BOM and header if it does not exist yet.
    pub fn ensure_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        write_header(file)?;
        log::info!("created work log {}", self.path.display());
        Ok(())
    }

    /// Validates the form and appends one row. Nothing is written on
    /// validation failure.
    pub fn submit(&self, form: &LogForm) -> Result<LogEntry> {
        let entry = form.validate()?;
        self.append(&entry)?;
        Ok(entry)
    }

    fn append(&self, entry: &LogEntry) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if file.metadata()?.len() == 0 {
            file = write_header(file)?;
        }

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        wtr.serialize(entry)?;
        wtr.flush()?;

        log::debug!("appended log entry {} to {}", entry.date_range, self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<LogTable> {
        if !self.path.exists() {
            return Ok(LogTable { file_missing: true, ..LogTable::default() });
        }

        let content = fs::read_to_string(&self.path)?;
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut table = LogTable::default();
        let mut records = rdr.records();

        if let Some(header) = records.next() {
            let header = header?;
            if !header.iter().eq(LOG_HEADERS.iter().copied()) {
                log::warn!("unexpected header in {}: {:?}", self.path.display(), header);
                table.header_mismatch = true;
            }
        }

        for record in records {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            table.entries.push(LogEntry::from_fields(record.iter()));
        }

        Ok(table)
    }
}

fn write_header(mut file: fs::File) -> Result<fs::File> {
    file.write_all(UTF8_BOM.as_bytes())?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);
    wtr.write_record(LOG_HEADERS)?;
    wtr.flush()?;
    wtr.into_inner().map_err(|e| e.into_error().into())
}
