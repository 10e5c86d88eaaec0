// 🔎 Lookup Resolver - Exact match first, nearest-year fallback second
//
// Order of checks:
//   1. model must fuzzy-match a known model of the brand
//   2. year comes from the input as an integer, else from the VIN
//   3. exact (brand, model, year) record
//   4. closest year for the same brand + model

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, VehicleRecord};
use crate::error::{MissReason, YearError};
use crate::fuzzy::FuzzyMatcher;
use crate::miss_log::{record_miss, MissLogEntry, MissSink};
use crate::normalize::{normalize, parse_year};
use crate::vin::try_decode_year;

/// Marker returned to callers when a query resolves to nothing
pub const NOT_FOUND_MARKER: &str = "Not enough info";

// ============================================================================
// MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    /// Record for exactly the requested brand, model and year
    Exact { record: VehicleRecord },

    /// Closest-year record for the brand + model; the requested year had none
    Fallback {
        record: VehicleRecord,
        requested_year: i32,
    },

    NotFound { reason: MissReason },
}

impl MatchResult {
    pub fn record(&self) -> Option<&VehicleRecord> {
        match self {
            MatchResult::Exact { record } => Some(record),
            MatchResult::Fallback { record, .. } => Some(record),
            MatchResult::NotFound { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<MissReason> {
        match self {
            MatchResult::NotFound { reason } => Some(*reason),
            _ => None,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, MatchResult::Exact { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, MatchResult::Fallback { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MatchResult::NotFound { .. })
    }

    /// "Closest year match used instead of {year}" for fallbacks.
    pub fn note(&self) -> Option<String> {
        match self {
            MatchResult::Fallback { requested_year, .. } => {
                Some(format!("Closest year match used instead of {}", requested_year))
            }
            _ => None,
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

pub struct Resolver<'a> {
    catalog: &'a Catalog,
    matcher: FuzzyMatcher,
}

impl<'a> Resolver<'a> {
    /// Resolver with the default fuzzy threshold
    pub fn new(catalog: &'a Catalog) -> Self {
        Resolver {
            catalog,
            matcher: FuzzyMatcher::new(),
        }
    }

    pub fn with_matcher(catalog: &'a Catalog, matcher: FuzzyMatcher) -> Self {
        Resolver { catalog, matcher }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    /// Resolve one query. Pure: nothing is logged to the miss sink.
    ///
    /// `year_or_vin` is either a year (anything [`parse_year`] accepts) or a
    /// VIN; blank means neither was given.
    pub fn resolve(&self, brand: &str, raw_model: &str, year_or_vin: &str) -> MatchResult {
        self.resolve_with_year(brand, raw_model, self.determine_year(year_or_vin))
    }

    /// Resolve with a year the caller already determined. An `Err` year means
    /// the query carried no usable year; it only surfaces once the model is known.
    pub fn resolve_with_year(
        &self,
        brand: &str,
        raw_model: &str,
        year: Result<i32, YearError>,
    ) -> MatchResult {
        let brand = match normalize(brand) {
            Some(b) => b,
            None => return not_found(MissReason::ModelNotRecognized),
        };

        let model = match self.matcher.match_model(&brand, raw_model, self.catalog) {
            Some(m) => m.model,
            None => return not_found(MissReason::ModelNotRecognized),
        };

        let year = match year {
            Ok(year) => year,
            Err(e) => {
                debug!(brand = brand.as_str(), model = model.as_str(), "no year: {}", e);
                return not_found(MissReason::NoYearOrVin);
            }
        };

        if let Some(record) = self.catalog.find_exact(&brand, &model, year) {
            debug!(brand = brand.as_str(), model = model.as_str(), year, "exact match");
            return MatchResult::Exact {
                record: record.clone(),
            };
        }

        match self.catalog.nearest_year(&brand, &model, year) {
            Some(record) => {
                debug!(
                    brand = brand.as_str(),
                    model = model.as_str(),
                    requested = year,
                    used = ?record.year,
                    "closest year fallback"
                );
                MatchResult::Fallback {
                    record: record.clone(),
                    requested_year: year,
                }
            }
            None => not_found(MissReason::NoMatchFound),
        }
    }

    /// Resolve and write a miss log entry when nothing was found.
    pub fn lookup(
        &self,
        brand: &str,
        raw_model: &str,
        year_or_vin: &str,
        sink: &mut dyn MissSink,
    ) -> MatchResult {
        let result = self.resolve(brand, raw_model, year_or_vin);

        if let Some(reason) = result.reason() {
            record_miss(
                sink,
                MissLogEntry::new(
                    &normalize(brand).unwrap_or_default(),
                    &normalize(raw_model).unwrap_or_default(),
                    year_or_vin.trim(),
                    reason,
                ),
            );
        }

        result
    }

    /// Year from the 10th character of a VIN only.
    pub fn year_from_vin(&self, vin: &str) -> Result<i32, YearError> {
        try_decode_year(vin.trim(), self.catalog.year_codes())
    }

    /// Year from an integer input, else from the VIN's year code.
    pub fn determine_year(&self, year_or_vin: &str) -> Result<i32, YearError> {
        let input = year_or_vin.trim();
        if let Some(year) = parse_year(input) {
            return Ok(year);
        }

        match try_decode_year(input, self.catalog.year_codes()) {
            Ok(year) => Ok(year),
            // Too short for a VIN: it was meant as a year
            Err(YearError::VinTooShort(_)) => Err(YearError::InvalidYear(input.to_string())),
            Err(e) => Err(e),
        }
    }
}

fn not_found(reason: MissReason) -> MatchResult {
    MatchResult::NotFound { reason }
}

// ============================================================================
// TESTS
// ============================================================================
