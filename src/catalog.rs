// 📚 Reference Catalog - Load-once vehicle index + VIN year-code table
// Both sources are read at startup; a missing or malformed file is fatal.
// After load everything is immutable and passed around as &Catalog.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::normalize::{normalize, parse_year};

pub const BRAND_COLUMN: &str = "brand";
pub const MODEL_COLUMN: &str = "model";
pub const YEAR_COLUMN: &str = "year";

// ============================================================================
// VEHICLE RECORD
// ============================================================================

/// One row of the reference dataset.
///
/// `brand` and `model` are already trimmed and lower-cased. Every other
/// column is carried verbatim in `extra`, in the dataset's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub brand: String,
    pub model: String,

    /// `None` when the year cell was blank or not an integer; such rows never match
    pub year: Option<i32>,

    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

impl VehicleRecord {
    pub fn new(brand: &str, model: &str, year: i32) -> Self {
        VehicleRecord {
            brand: brand.trim().to_lowercase(),
            model: model.trim().to_lowercase(),
            year: Some(year),
            extra: Vec::new(),
        }
    }

    pub fn with_field(mut self, column: &str, value: &str) -> Self {
        self.extra.push((column.to_string(), value.to_string()));
        self
    }

    /// Value of a column as it would be written back out.
    pub fn field(&self, column: &str) -> Option<String> {
        match column {
            BRAND_COLUMN => Some(self.brand.clone()),
            MODEL_COLUMN => Some(self.model.clone()),
            YEAR_COLUMN => Some(self.year.map(|y| y.to_string()).unwrap_or_default()),
            _ => self
                .extra
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.clone()),
        }
    }

    /// Record as a JSON object keyed by `columns`, in that order.
    /// The year stays numeric (`null` when the cell had none).
    pub fn to_json(&self, columns: &[String]) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for column in columns {
            let value = match column.as_str() {
                YEAR_COLUMN => serde_json::json!(self.year),
                _ => serde_json::json!(self.field(column).unwrap_or_default()),
            };
            map.insert(column.clone(), value);
        }
        serde_json::Value::Object(map)
    }
}

// ============================================================================
// YEAR CODE TABLE
// ============================================================================

#[derive(Debug, Deserialize)]
struct YearCodeRow {
    #[serde(rename = "Code")]
    code: String,

    #[serde(rename = "Year")]
    year: i32,
}

/// Mapping from the 10th VIN character to a model year.
#[derive(Debug, Clone, Default)]
pub struct YearCodeTable {
    codes: HashMap<char, i32>,
}

impl YearCodeTable {
    pub fn new() -> Self {
        YearCodeTable {
            codes: HashMap::new(),
        }
    }

    /// Load the table from a CSV file with `Code` and `Year` columns
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open year code table: {:?}", path.as_ref()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to load year code table: {:?}", path.as_ref()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut table = YearCodeTable::new();

        for (index, result) in rdr.deserialize().enumerate() {
            let row: YearCodeRow =
                result.with_context(|| format!("Failed to parse year code row {}", index + 1))?;

            let mut chars = row.code.trim().chars();
            let code = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => bail!(
                    "Year code row {}: code {:?} must be a single character",
                    index + 1,
                    row.code
                ),
            };

            table.insert(code, row.year);
        }

        Ok(table)
    }

    /// Add a code. The code is upper-cased; a repeated code replaces the earlier year.
    pub fn insert(&mut self, code: char, year: i32) {
        let code = code.to_ascii_uppercase();
        if let Some(previous) = self.codes.insert(code, year) {
            if previous != year {
                warn!(code = %code, previous, year, "year code listed twice, keeping the later year");
            }
        }
    }

    /// Year for a code, case-insensitive.
    pub fn year_for(&self, code: char) -> Option<i32> {
        self.codes.get(&code.to_ascii_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, Default)]
struct BrandIndex {
    /// Distinct model names in first-appearance order
    models: Vec<String>,

    /// model -> record indices in catalog order
    records_by_model: HashMap<String, Vec<usize>>,
}

/// Immutable, brand-scoped index over the reference dataset.
#[derive(Debug, Clone)]
pub struct Catalog {
    columns: Vec<String>,
    records: Vec<VehicleRecord>,
    brands: HashMap<String, BrandIndex>,
    year_codes: YearCodeTable,
}

impl Catalog {
    /// Build the index over already-loaded records.
    ///
    /// `columns` is the output column order; it must name brand, model and year.
    pub fn new(columns: Vec<String>, records: Vec<VehicleRecord>, year_codes: YearCodeTable) -> Self {
        let mut brands: HashMap<String, BrandIndex> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            let entry = brands.entry(record.brand.clone()).or_default();
            let indices = entry
                .records_by_model
                .entry(record.model.clone())
                .or_default();
            if indices.is_empty() {
                entry.models.push(record.model.clone());
            }
            indices.push(idx);
        }

        Catalog {
            columns,
            records,
            brands,
            year_codes,
        }
    }

    /// Build a catalog from records alone, using brand/model/year plus the
    /// extra columns of the first record as column order.
    pub fn from_records(records: Vec<VehicleRecord>, year_codes: YearCodeTable) -> Self {
        let mut columns = vec![
            BRAND_COLUMN.to_string(),
            MODEL_COLUMN.to_string(),
            YEAR_COLUMN.to_string(),
        ];
        if let Some(first) = records.first() {
            columns.extend(first.extra.iter().map(|(name, _)| name.clone()));
        }
        Catalog::new(columns, records, year_codes)
    }

    /// Load the vehicle dataset and the year-code table from disk.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(dataset_path: P, year_codes_path: Q) -> Result<Self> {
        let file = File::open(dataset_path.as_ref()).with_context(|| {
            format!("Failed to open vehicle dataset: {:?}", dataset_path.as_ref())
        })?;
        let year_codes = YearCodeTable::load(year_codes_path)?;

        let catalog = Self::from_reader(file, year_codes).with_context(|| {
            format!("Failed to load vehicle dataset: {:?}", dataset_path.as_ref())
        })?;

        info!(
            records = catalog.len(),
            brands = catalog.brand_count(),
            year_codes = catalog.year_codes().len(),
            "reference catalog loaded"
        );

        Ok(catalog)
    }

    /// Parse the vehicle dataset CSV. Requires `brand`, `model`, `year` headers;
    /// any other column is passed through.
    pub fn from_reader<R: Read>(reader: R, year_codes: YearCodeTable) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers().context("Failed to read dataset header")?.clone();
        let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        let position = |name: &str| -> Result<usize> {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| anyhow!("Dataset is missing required column '{}'", name))
        };
        let brand_idx = position(BRAND_COLUMN)?;
        let model_idx = position(MODEL_COLUMN)?;
        let year_idx = position(YEAR_COLUMN)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, result) in rdr.records().enumerate() {
            let row = result.with_context(|| format!("Failed to parse dataset row {}", index + 1))?;

            let brand = row.get(brand_idx).and_then(normalize);
            let model = row.get(model_idx).and_then(normalize);
            let (brand, model) = match (brand, model) {
                (Some(b), Some(m)) => (b, m),
                _ => {
                    warn!(row = index + 1, "dataset row without brand or model, skipped");
                    skipped += 1;
                    continue;
                }
            };

            let year_cell = row.get(year_idx).unwrap_or("");
            let year = parse_year(year_cell);
            if year.is_none() && !year_cell.trim().is_empty() {
                debug!(row = index + 1, year = year_cell, "dataset year is not an integer");
            }

            let extra = columns
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != brand_idx && *i != model_idx && *i != year_idx)
                .map(|(i, name)| (name.clone(), row.get(i).unwrap_or("").to_string()))
                .collect();

            records.push(VehicleRecord {
                brand,
                model,
                year,
                extra,
            });
        }

        if skipped > 0 {
            warn!(skipped, "dataset rows skipped");
        }

        Ok(Catalog::new(columns, records, year_codes))
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Distinct model names for a normalized brand, in first-appearance order.
    pub fn models_for_brand(&self, brand: &str) -> &[String] {
        self.brands
            .get(brand)
            .map(|b| b.models.as_slice())
            .unwrap_or(&[])
    }

    /// First record (catalog order) matching brand, model and year exactly.
    pub fn find_exact(&self, brand: &str, model: &str, year: i32) -> Option<&VehicleRecord> {
        self.records_for(brand, model)
            .find(|record| record.year == Some(year))
    }

    /// Records of a brand+model that have a year, ordered by distance to
    /// `target_year`. Ties keep catalog order.
    pub fn candidates_for_brand_model(
        &self,
        brand: &str,
        model: &str,
        target_year: i32,
    ) -> Vec<&VehicleRecord> {
        let mut candidates: Vec<&VehicleRecord> = self
            .records_for(brand, model)
            .filter(|record| record.year.is_some())
            .collect();
        candidates.sort_by_key(|record| year_distance(record, target_year));
        candidates
    }

    /// Closest-year record of a brand+model, first in catalog order on ties.
    pub fn nearest_year(&self, brand: &str, model: &str, target_year: i32) -> Option<&VehicleRecord> {
        self.candidates_for_brand_model(brand, model, target_year)
            .into_iter()
            .next()
    }

    fn records_for<'a>(&'a self, brand: &str, model: &str) -> impl Iterator<Item = &'a VehicleRecord> + 'a {
        self.brands
            .get(brand)
            .and_then(|b| b.records_by_model.get(model))
            .into_iter()
            .flatten()
            .map(move |&idx| &self.records[idx])
    }

    pub fn year_codes(&self) -> &YearCodeTable {
        &self.year_codes
    }

    /// Output column order (the dataset header).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[VehicleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn brand_count(&self) -> usize {
        self.brands.len()
    }

    pub fn model_count(&self) -> usize {
        self.brands.values().map(|b| b.models.len()).sum()
    }
}

fn year_distance(record: &VehicleRecord, target_year: i32) -> u64 {
    record
        .year
        .map(|y| (i64::from(y) - i64::from(target_year)).unsigned_abs())
        .unwrap_or(u64::MAX)
}

// ============================================================================
// TESTS
// ============================================================================
