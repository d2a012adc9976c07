//! Patient login conversion.

use crate::Result;
use axum::Json;
use pons_mapping::{map, models::PatientLogin};
use serde_json::Value;
use validator::Validate;

/// Convert patient login info to a FHIR Patient transaction Bundle.
///
/// Pure conversion: the bundle is echoed to the caller, not forwarded.
pub async fn convert_patient(Json(login): Json<PatientLogin>) -> Result<Json<Value>> {
    login.validate()?;
    Ok(Json(map::patient_bundle(&login)))
}
