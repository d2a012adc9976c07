//! Dose-calendar codec.
//!
//! The upstream FHIR server has no field for per-day dose ticks, so the
//! calendar travels as a JSON array serialized into `note[0].text` of the
//! MedicationRequest. Day is an ISO date, `taken_timestamp` an ISO datetime
//! or null. Existing server content predates this service, so the decoder
//! must tolerate notes that are not valid JSON at all.

use crate::models::{DoseEntry, DosePeriod};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DoseError {
    #[error("dose note is not a JSON list: {0}")]
    NotAList(String),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a dose calendar to the note-text wire form.
pub fn encode(doses: &[DoseEntry]) -> String {
    serde_json::to_string(doses).expect("dose entries serialize infallibly")
}

/// Parse a note text back into a dose calendar.
pub fn decode(text: &str) -> Result<Vec<DoseEntry>, DoseError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_array() {
        return Err(DoseError::NotAList(text.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

/// Lenient variant used when reshaping server content for callers: a note
/// that does not parse as a JSON list degrades to a single raw-text element
/// instead of failing the whole request.
pub fn decode_lenient(text: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        _ => vec![Value::String(text.to_string())],
    }
}

/// Find the note text carrying the dose calendar among a resource's notes.
///
/// Dose updates append a fresh note rather than rewriting the old one, so
/// the *last* JSON-list note wins.
pub fn find_in_notes(notes: &[Value]) -> Option<Vec<DoseEntry>> {
    notes
        .iter()
        .rev()
        .filter_map(|note| note.get("text").and_then(Value::as_str))
        .find_map(|text| decode(text).ok())
}

/// Mark a dose taken, updating the matching `(day, period)` slot in place or
/// appending a new one.
pub fn upsert(
    doses: &mut Vec<DoseEntry>,
    day: NaiveDate,
    period: DosePeriod,
    taken: NaiveDateTime,
) {
    for dose in doses.iter_mut() {
        if dose.day == day && dose.period == period {
            dose.taken_timestamp = Some(taken);
            return;
        }
    }
    doses.push(DoseEntry {
        day,
        period,
        taken_timestamp: Some(taken),
    });
}
