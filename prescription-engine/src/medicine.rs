//! Medicine list codec.
//!
//! The ordered list of medicine lines persists as a JSON array alongside two
//! legacy scalar columns kept for backward compatibility: `medicine` (the
//! first line's name) and `quantity` (the sum of line quantities). Rows
//! written before the list column existed carry only the scalars; the
//! decoder lifts those into a single-line list.

use crate::error::{EngineError, EngineResult};
use crate::models::MedicineLine;

/// Persisted form of a medicine list plus its derived legacy fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMedicines {
    /// JSON array of `{name, dosage, quantity, instructions}`
    pub lines_json: String,
    /// Legacy scalar: first line's name
    pub medicine: String,
    /// Legacy scalar: sum of line quantities
    pub quantity: i32,
}

/// Validate a submitted medicine list.
///
/// # Errors
///
/// [`EngineError::Validation`] when the list is empty, every name is blank,
/// or any quantity is below 1.
pub fn validate_lines(lines: &[MedicineLine]) -> EngineResult<()> {
    if lines.is_empty() || lines.iter().all(|line| line.name.trim().is_empty()) {
        return Err(EngineError::validation("at least one medicine required"));
    }
    for line in lines {
        if line.quantity < 1 {
            return Err(EngineError::Validation(format!(
                "medicine '{}' must have a quantity of at least 1",
                line.name
            )));
        }
    }
    Ok(())
}

/// Aggregate quantity across all lines.
pub fn total_quantity(lines: &[MedicineLine]) -> i32 {
    lines.iter().map(|line| line.quantity).sum()
}

/// Encode a medicine list into its persisted form.
///
/// # Errors
///
/// Propagates [`validate_lines`] failures; serialization itself is
/// infallible for well-formed lines.
pub fn encode_lines(lines: &[MedicineLine]) -> EngineResult<EncodedMedicines> {
    validate_lines(lines)?;
    let lines_json = serde_json::to_string(lines)
        .map_err(|e| EngineError::Repository(format!("failed to encode medicine list: {e}")))?;
    let medicine = lines
        .first()
        .map(|line| line.name.clone())
        .unwrap_or_default();
    Ok(EncodedMedicines {
        lines_json,
        medicine,
        quantity: total_quantity(lines),
    })
}

/// Decode a persisted JSON medicine list.
///
/// # Errors
///
/// [`EngineError::Repository`] when the stored value is not a valid list.
pub fn decode_lines(raw: &str) -> EngineResult<Vec<MedicineLine>> {
    serde_json::from_str(raw)
        .map_err(|e| EngineError::Repository(format!("malformed medicine list: {e}")))
}

/// Decode the stored medicine columns, falling back to the legacy scalar
/// pair for rows that predate the list column.
pub fn decode_stored(
    lines_json: Option<&str>,
    legacy_medicine: &str,
    legacy_quantity: i32,
) -> EngineResult<Vec<MedicineLine>> {
    match lines_json {
        Some(raw) => decode_lines(raw),
        None => Ok(vec![MedicineLine {
            name: legacy_medicine.to_string(),
            dosage: String::new(),
            quantity: legacy_quantity,
            instructions: String::new(),
        }]),
    }
}
