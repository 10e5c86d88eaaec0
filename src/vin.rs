// 🔑 VIN Decoder - Model year from the 10th VIN character
//
// Known limitation: no check-digit or manufacturer validation is done. The
// 10th character is trusted as-is, which is what the reference data expects.

use crate::catalog::YearCodeTable;
use crate::error::YearError;

/// 1-indexed position of the model-year code in a VIN
pub const YEAR_CODE_POSITION: usize = 10;

/// Decode a model year, or `None` when the VIN is too short or its code is unknown.
pub fn decode_year(vin: &str, table: &YearCodeTable) -> Option<i32> {
    try_decode_year(vin, table).ok()
}

/// Like [`decode_year`] but says why decoding failed.
pub fn try_decode_year(vin: &str, table: &YearCodeTable) -> Result<i32, YearError> {
    let code = vin
        .chars()
        .nth(YEAR_CODE_POSITION - 1)
        .ok_or_else(|| YearError::VinTooShort(vin.to_string()))?;

    let code = code.to_ascii_uppercase();
    table.year_for(code).ok_or(YearError::UnknownVinCode(code))
}
