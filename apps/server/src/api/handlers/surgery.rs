//! Surgery endpoints.

use super::{failure_message, require_uhid, success_message, UhidQuery};
use crate::{fhir, state::AppState, Result};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use pons_mapping::{map, models::SurgeryDetails};
use serde_json::{json, Value};
use validator::Validate;

/// Convert surgery details and post the whole Bundle to the FHIR server.
pub async fn post_surgeries(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(surgeries): Json<Vec<SurgeryDetails>>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    for surgery in &surgeries {
        surgery.validate()?;
    }

    let bundle = map::surgery_bundle(&query.uhid, &surgeries, Utc::now().naive_utc());

    match state.fhir.transaction(&bundle).await {
        Ok(_) => Ok(success_message("FHIR resources posted successfully.")),
        Err(e) => Ok(failure_message(e.to_string())),
    }
}

/// All Procedure resources whose subject is the given patient.
pub async fn get_procedures(
    State(state): State<AppState>,
    Path(uhid): Path<String>,
) -> Result<Json<Value>> {
    require_uhid(&uhid)?;

    let subject = fhir::subject_query(&uhid);
    match state.fhir.search("Procedure", &[("subject", subject.as_str())]).await {
        Ok(data) => {
            if fhir::entry_resources(&data).is_empty() {
                return Ok(failure_message(format!(
                    "No Procedures found for UHID {uhid}"
                )));
            }
            Ok(Json(json!({"success": true, "procedures": data})))
        }
        Err(e) => Ok(failure_message(e.to_string())),
    }
}
