// 📝 Miss Logger - Append-only audit trail of unresolved queries
// One CSV row per NotFound outcome. No dedup, no rotation.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::MissReason;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const MISS_LOG_HEADER: [&str; 5] = ["brand", "model", "vin_or_year", "reason", "timestamp"];

// ============================================================================
// MISS LOG ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissLogEntry {
    pub brand: String,
    pub model: String,

    /// The year or VIN the query carried, empty if neither
    pub vin_or_year: String,

    pub reason: MissReason,
    pub timestamp: NaiveDateTime,
}

impl MissLogEntry {
    /// Entry stamped with the current local time.
    pub fn new(brand: &str, model: &str, vin_or_year: &str, reason: MissReason) -> Self {
        MissLogEntry {
            brand: brand.to_string(),
            model: model.to_string(),
            vin_or_year: vin_or_year.to_string(),
            reason,
            timestamp: Local::now().naive_local(),
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    fn to_row(&self) -> [String; 5] {
        [
            self.brand.clone(),
            self.model.clone(),
            self.vin_or_year.clone(),
            self.reason.as_str().to_string(),
            self.formatted_timestamp(),
        ]
    }
}

// ============================================================================
// SINKS
// ============================================================================

/// Destination for miss entries.
pub trait MissSink {
    fn log(&mut self, entry: MissLogEntry) -> Result<()>;
}

/// Appends entries to a CSV file, writing the header when the file is new or empty.
#[derive(Debug, Clone)]
pub struct CsvMissLog {
    path: PathBuf,
}

impl CsvMissLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvMissLog {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MissSink for CsvMissLog {
    fn log(&mut self, entry: MissLogEntry) -> Result<()> {
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open miss log: {:?}", self.path))?;

        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            wtr.write_record(MISS_LOG_HEADER)
                .context("Failed to write miss log header")?;
        }
        wtr.write_record(entry.to_row())
            .context("Failed to write miss log entry")?;
        wtr.flush().context("Failed to flush miss log")?;

        Ok(())
    }
}

/// Keeps entries in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMissLog {
    pub entries: Vec<MissLogEntry>,
}

impl MemoryMissLog {
    pub fn new() -> Self {
        MemoryMissLog { entries: Vec::new() }
    }

    pub fn reasons(&self) -> Vec<MissReason> {
        self.entries.iter().map(|e| e.reason).collect()
    }
}

impl MissSink for MemoryMissLog {
    fn log(&mut self, entry: MissLogEntry) -> Result<()> {
        self.entries.push(entry);
        Ok(())
    }
}

/// Log an entry; a sink failure is reported but never interrupts the caller.
pub fn record_miss(sink: &mut dyn MissSink, entry: MissLogEntry) {
    if let Err(e) = sink.log(entry) {
        warn!("failed to write miss log entry: {:#}", e);
    }
}

// ============================================================================
// TESTS
// ============================================================================
