// ⚠️ Lookup error taxonomy
// Only catalog loading is fatal (anyhow at the load boundary). Everything here
// is a per-query condition that ends up as a NotFound outcome or "no year".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a year could not be determined from the query input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum YearError {
    #[error("year {0:?} is not an integer")]
    InvalidYear(String),

    #[error("VIN {0:?} is shorter than 10 characters")]
    VinTooShort(String),

    #[error("VIN year code {0:?} is not in the year table")]
    UnknownVinCode(char),
}

/// Fixed set of reasons carried by a NotFound outcome and written to the miss log.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Brand or model cell absent/blank (batch rows only)
    #[error("missing brand or model")]
    MissingFields,

    /// Brand unknown, or best fuzzy candidate under the threshold
    #[error("model not recognized for brand")]
    ModelNotRecognized,

    /// Neither a parsable year nor a decodable VIN
    #[error("no valid year or VIN")]
    NoYearOrVin,

    /// Model and year resolved but no catalog record, exact or fallback
    #[error("no match found")]
    NoMatchFound,
}

impl MissReason {
    /// Reason text as written to the miss log.
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::MissingFields => "missing brand or model",
            MissReason::ModelNotRecognized => "model not recognized for brand",
            MissReason::NoYearOrVin => "no valid year or VIN",
            MissReason::NoMatchFound => "no match found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_display_matches_log_text() {
        for reason in [
            MissReason::MissingFields,
            MissReason::ModelNotRecognized,
            MissReason::NoYearOrVin,
            MissReason::NoMatchFound,
        ] {
            assert_eq!(reason.to_string(), reason.as_str());
        }
    }

    #[test]
    fn test_year_error_messages() {
        let err = YearError::UnknownVinCode('Z');
        assert!(err.to_string().contains("'Z'"));

        let err = YearError::VinTooShort("WAU".to_string());
        assert!(err.to_string().contains("shorter than 10"));
    }
}
