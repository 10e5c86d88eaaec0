// 📦 Batch Reconciler - Resolve a whole table of queries
// Rows are independent: one bad row never stops the rest. Every NotFound,
// including rows rejected before resolution, lands in the miss log.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{MissReason, YearError};
use crate::miss_log::{record_miss, MissLogEntry, MissSink};
use crate::normalize::{is_blank, normalize, parse_year};
use crate::resolver::{MatchResult, Resolver, NOT_FOUND_MARKER};

pub const NOTE_COLUMN: &str = "Note";
pub const RESULT_COLUMN: &str = "Result";

// ============================================================================
// BATCH ROW
// ============================================================================

/// One query row. Columns missing from the input file read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub year: Option<String>,

    #[serde(default)]
    pub vin: Option<String>,
}

impl BatchRow {
    pub fn new(brand: &str, model: &str) -> Self {
        BatchRow {
            brand: Some(brand.to_string()),
            model: Some(model.to_string()),
            year: None,
            vin: None,
        }
    }

    pub fn with_year(mut self, year: &str) -> Self {
        self.year = Some(year.to_string());
        self
    }

    pub fn with_vin(mut self, vin: &str) -> Self {
        self.vin = Some(vin.to_string());
        self
    }

    /// Explicit year when present, otherwise the VIN, otherwise blank.
    /// This is the text written to the miss log.
    pub fn year_input(&self) -> &str {
        if !is_blank(self.year.as_deref()) {
            self.year.as_deref().unwrap_or("").trim()
        } else if !is_blank(self.vin.as_deref()) {
            self.vin.as_deref().unwrap_or("").trim()
        } else {
            ""
        }
    }
}

/// Read query rows from a CSV file with `brand`, `model` and optional `year`/`vin` columns
pub fn load_rows<P: AsRef<Path>>(path: P) -> Result<Vec<BatchRow>> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open batch input: {:?}", path.as_ref()))?;
    rows_from_reader(file)
        .with_context(|| format!("Failed to read batch input: {:?}", path.as_ref()))
}

pub fn rows_from_reader<R: Read>(reader: R) -> Result<Vec<BatchRow>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut rows = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        let row: BatchRow = result.with_context(|| format!("Failed to parse batch row {}", index + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

// ============================================================================
// BATCH STATS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub exact: usize,
    pub fallback: usize,
    pub not_found: usize,
}

impl BatchStats {
    pub fn record(&mut self, result: &MatchResult) {
        match result {
            MatchResult::Exact { .. } => self.exact += 1,
            MatchResult::Fallback { .. } => self.fallback += 1,
            MatchResult::NotFound { .. } => self.not_found += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.exact + self.fallback + self.not_found
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows: {} exact, {} fallback, {} not found",
            self.total(),
            self.exact,
            self.fallback,
            self.not_found
        )
    }
}

// ============================================================================
// BATCH REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One outcome per input row, in input order
    pub outcomes: Vec<MatchResult>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Write the result table: catalog columns, then `Note`, then `Result`.
    /// NotFound rows leave the record columns empty and carry the marker in `Result`.
    pub fn write_csv<W: Write>(&self, columns: &[String], writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
        header.push(NOTE_COLUMN);
        header.push(RESULT_COLUMN);
        wtr.write_record(&header).context("Failed to write results header")?;

        for outcome in &self.outcomes {
            let mut row: Vec<String> = match outcome.record() {
                Some(record) => columns
                    .iter()
                    .map(|c| record.field(c).unwrap_or_default())
                    .collect(),
                None => vec![String::new(); columns.len()],
            };
            row.push(outcome.note().unwrap_or_default());
            row.push(if outcome.is_not_found() {
                NOT_FOUND_MARKER.to_string()
            } else {
                String::new()
            });
            wtr.write_record(&row).context("Failed to write results row")?;
        }

        wtr.flush().context("Failed to flush results")?;
        Ok(())
    }

    /// Write the result table to a file.
    pub fn save_csv<P: AsRef<Path>>(&self, columns: &[String], path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create results file: {:?}", path.as_ref()))?;
        self.write_csv(columns, file)
    }
}

// ============================================================================
// BATCH RECONCILER
// ============================================================================

pub struct BatchReconciler<'a> {
    resolver: Resolver<'a>,
}

impl<'a> BatchReconciler<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        BatchReconciler { resolver }
    }

    /// Reconciler with the default resolver over `catalog`.
    pub fn for_catalog(catalog: &'a Catalog) -> Self {
        BatchReconciler::new(Resolver::new(catalog))
    }

    /// Classify every row, accumulate stats and log each NotFound to `sink`.
    pub fn reconcile<I>(&self, rows: I, sink: &mut dyn MissSink) -> BatchReport
    where
        I: IntoIterator<Item = BatchRow>,
    {
        let mut stats = BatchStats::default();
        let mut outcomes = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            let result = self.reconcile_row(&row, sink);
            debug!(row = index + 1, outcome = ?result.reason(), exact = result.is_exact(), "batch row");
            stats.record(&result);
            outcomes.push(result);
        }

        info!(
            total = stats.total(),
            exact = stats.exact,
            fallback = stats.fallback,
            not_found = stats.not_found,
            "batch reconciled"
        );

        BatchReport { outcomes, stats }
    }

    fn reconcile_row(&self, row: &BatchRow, sink: &mut dyn MissSink) -> MatchResult {
        let brand = row.brand.as_deref().and_then(normalize);
        let model = row.model.as_deref().and_then(normalize);
        let year_input = row.year_input();

        let result = match (&brand, &model) {
            (Some(brand), Some(model)) => {
                self.resolver.resolve_with_year(brand, model, self.row_year(row))
            }
            _ => MatchResult::NotFound {
                reason: MissReason::MissingFields,
            },
        };

        if let Some(reason) = result.reason() {
            record_miss(
                sink,
                MissLogEntry::new(
                    brand.as_deref().unwrap_or(""),
                    model.as_deref().unwrap_or(""),
                    year_input,
                    reason,
                ),
            );
        }

        result
    }

    /// A non-blank year cell is the only source of the year, even when it
    /// does not parse. The VIN is decoded only when the year cell is blank.
    fn row_year(&self, row: &BatchRow) -> Result<i32, YearError> {
        if let Some(year) = row.year.as_deref().filter(|y| !y.trim().is_empty()) {
            return parse_year(year).ok_or_else(|| YearError::InvalidYear(year.trim().to_string()));
        }

        match row.vin.as_deref() {
            Some(vin) if !vin.trim().is_empty() => self.resolver.year_from_vin(vin),
            _ => Err(YearError::InvalidYear(String::new())),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
