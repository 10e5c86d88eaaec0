// 🔤 Text Normalizer - Canonical brand/model/year values
// Catalog stores brand and model trimmed + lower-cased, so every query value
// must go through the same conversion before it is compared.

/// Canonicalize a free-text brand or model value.
///
/// Returns `None` for blank input, otherwise the trimmed, lower-cased string.
/// Optional cells go through `cell.and_then(normalize)`.
pub fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Parse a year cell.
///
/// Accepts plain integers (`"2016"`) and integral decimals (`"2016.0"`, which
/// is how spreadsheet exports write numeric columns that contain blanks).
/// Anything else is "no year", never an error.
pub fn parse_year(value: &str) -> Option<i32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }

    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64 => Some(f as i32),
        _ => None,
    }
}

/// True when a raw cell carries no usable text.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Audi "), Some("audi".to_string()));
        assert_eq!(normalize("A3 Sportback"), Some("a3 sportback".to_string()));
    }

    #[test]
    fn test_normalize_missing_and_blank() {
        let missing: Option<&str> = None;
        assert_eq!(missing.and_then(normalize), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   \t"), None);
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["  BMW  ", "Série 3", "x5", "MERCEDES-BENZ", "ÄÖÜ klasse", " mixed Case "] {
            let once = normalize(raw);
            let twice = once.as_deref().and_then(normalize);
            assert_eq!(once, twice, "normalize not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_parse_year_integers() {
        assert_eq!(parse_year("2016"), Some(2016));
        assert_eq!(parse_year(" 1999 "), Some(1999));
        assert_eq!(parse_year("-5"), Some(-5));
    }

    #[test]
    fn test_parse_year_integral_decimal() {
        assert_eq!(parse_year("2016.0"), Some(2016));
        assert_eq!(parse_year("2016.5"), None);
    }

    #[test]
    fn test_parse_year_rejects_text() {
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("twenty"), None);
        assert_eq!(parse_year("WAUZZZF46GA012345"), None);
        assert_eq!(parse_year("NaN"), None);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some("  ")));
        assert!(!is_blank(Some("a3")));
    }
}
