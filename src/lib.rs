// Vehicle Lookup - Core Library
// Matching engine used by the CLI and by tests

pub mod normalize;
pub mod error;
pub mod catalog;    // Reference Catalog - dataset + year-code index
pub mod vin;        // VIN Decoder
pub mod fuzzy;      // Fuzzy Model Matcher
pub mod resolver;   // Lookup Resolver - exact + nearest-year fallback
pub mod miss_log;   // Miss Logger - append-only audit trail
pub mod batch;      // Batch Reconciler

// Re-export commonly used types
pub use catalog::{Catalog, VehicleRecord, YearCodeTable};
pub use error::{MissReason, YearError};
pub use normalize::{normalize, parse_year};
pub use vin::{decode_year, try_decode_year};
pub use fuzzy::{FuzzyMatcher, ModelMatch, Score, DEFAULT_THRESHOLD};
pub use resolver::{MatchResult, Resolver, NOT_FOUND_MARKER};
pub use miss_log::{CsvMissLog, MemoryMissLog, MissLogEntry, MissSink};
pub use batch::{
    load_rows, rows_from_reader,
    BatchReconciler, BatchReport, BatchRow, BatchStats,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
