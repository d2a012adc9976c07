//! Medication endpoints.
//!
//! The dose calendar lives as a JSON note on each MedicationRequest (see
//! `pons_mapping::dose`); updating a dose is read-all, patch in memory,
//! PUT back: last write wins, no version check. Known limitation:
//! concurrent updates against the same patient's record can lose ticks.

use super::{failure_message, require_uhid, success_message, UhidQuery};
use crate::{fhir, state::AppState, Result};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use pons_mapping::{
    dose, map,
    models::{TabletPrescribed, UpdateDoseRequest},
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct DeleteMedicineQuery {
    pub uhid: String,
    pub tablet_name: String,
}

/// Convert prescribed tablets to a MedicationRequest Bundle and return it
/// without posting.
pub async fn convert_medications(
    Query(query): Query<UhidQuery>,
    Json(tablets): Json<TabletPrescribed>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    tablets.validate()?;

    let bundle = map::medication_bundle(&query.uhid, &tablets);
    Ok(Json(json!({"success": true, "fhir_bundle": bundle})))
}

/// Convert prescribed tablets and post the **active** ones.
pub async fn post_medications(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(tablets): Json<TabletPrescribed>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    tablets.validate()?;

    let bundle = map::medication_bundle(&query.uhid, &tablets);
    let mut posted = 0usize;

    for resource in fhir::entry_resources(&bundle) {
        if resource.get("status").and_then(Value::as_str) != Some("active") {
            continue;
        }
        if let Err(e) = state.fhir.create("MedicationRequest", &resource).await {
            return Ok(Json(json!({
                "success": false,
                "message": format!("Error posting MedicationRequest: {e}"),
                "posted": posted
            })));
        }
        posted += 1;
    }

    Ok(success_message(format!(
        "{posted} active MedicationRequest(s) posted successfully."
    )))
}

/// All MedicationRequest resources for a patient, every page drained.
pub async fn get_medications(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let subject = fhir::subject_query(&query.uhid);
    match state
        .fhir
        .search_all("MedicationRequest", &[("subject", subject.as_str())])
        .await
    {
        Ok(medications) => Ok(Json(json!({"success": true, "medications": medications}))),
        Err(e) => Ok(Json(json!({
            "success": false,
            "medications": [],
            "error": e.to_string()
        }))),
    }
}

/// Active medications for a patient with the dose calendar decoded.
pub async fn get_active_medications(
    State(state): State<AppState>,
    Path(uhid): Path<String>,
) -> Result<Json<Value>> {
    require_uhid(&uhid)?;

    let subject = fhir::subject_query(&uhid);
    match state
        .fhir
        .search_all(
            "MedicationRequest",
            &[("subject", subject.as_str()), ("status", "active")],
        )
        .await
    {
        Ok(resources) => {
            let medications: Vec<Value> = resources.iter().map(active_summary).collect();
            Ok(Json(json!({
                "success": true,
                "count": medications.len(),
                "active_medications": medications
            })))
        }
        Err(e) => Ok(Json(json!({"success": false, "error": e.to_string()}))),
    }
}

/// Delete the active MedicationRequests matching a tablet name
/// (case-insensitive).
pub async fn delete_active_medicine(
    State(state): State<AppState>,
    Query(query): Query<DeleteMedicineQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let identifier = fhir::identifier_query(&query.uhid);
    let data = state
        .fhir
        .search(
            "MedicationRequest",
            &[("identifier", identifier.as_str()), ("status", "active")],
        )
        .await?;

    let resources = fhir::entry_resources(&data);
    if resources.is_empty() {
        return Ok(failure_message("No active medicines found for this UHID."));
    }

    let mut deleted = Vec::new();
    let mut skipped = Vec::new();

    for resource in &resources {
        let Some(id) = resource.get("id").and_then(Value::as_str) else {
            continue;
        };
        let name = resource
            .pointer("/medicationCodeableConcept/text")
            .and_then(Value::as_str)
            .unwrap_or("");
        let status = resource.get("status").and_then(Value::as_str).unwrap_or("");

        if !name.eq_ignore_ascii_case(&query.tablet_name) || status != "active" {
            continue;
        }

        match state.fhir.delete("MedicationRequest", id).await {
            Ok(()) => deleted.push(json!(name)),
            Err(e) => skipped.push(json!({"id": id, "error": e.to_string()})),
        }
    }

    if deleted.is_empty() {
        return Ok(Json(json!({
            "success": false,
            "message": format!(
                "No active medicine named '{}' found for UHID {}.",
                query.tablet_name, query.uhid
            ),
            "skipped": skipped
        })));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Deleted {} record(s) successfully.", deleted.len()),
        "deleted_medicines": deleted
    })))
}

/// Mark a dose taken for a tablet on a given day and period.
///
/// The updated calendar is appended as a fresh note so prior notes stay
/// intact; readers pick the latest JSON-list note.
pub async fn update_dose_taken(
    State(state): State<AppState>,
    Path(uhid): Path<String>,
    Json(body): Json<UpdateDoseRequest>,
) -> Result<Json<Value>> {
    require_uhid(&uhid)?;
    body.validate()?;

    let subject = fhir::subject_query(&uhid);
    let resources = state
        .fhir
        .search_all("MedicationRequest", &[("subject", subject.as_str())])
        .await?;

    let mut updated = 0usize;

    for resource in &resources {
        if resource.pointer("/medicationCodeableConcept/text").and_then(Value::as_str)
            != Some(body.tablet_name.as_str())
        {
            continue;
        }

        let notes = resource
            .get("note")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut doses = dose::find_in_notes(&notes).unwrap_or_default();
        let taken = body
            .taken_timestamp
            .unwrap_or_else(|| Utc::now().naive_utc());
        dose::upsert(&mut doses, body.dose_day, body.dose_period, taken);

        let mut updated_notes = notes;
        updated_notes.push(json!({"text": dose::encode(&doses)}));

        let Some(id) = resource.get("id").and_then(Value::as_str) else {
            continue;
        };

        let payload = json!({
            "resourceType": "MedicationRequest",
            "id": id,
            "identifier": resource.get("identifier").cloned().unwrap_or_else(|| json!([])),
            "status": resource.get("status").and_then(Value::as_str).unwrap_or("active"),
            "intent": resource.get("intent").and_then(Value::as_str).unwrap_or("order"),
            "subject": resource.get("subject"),
            "medicationCodeableConcept": resource.get("medicationCodeableConcept"),
            "dosageInstruction": resource.get("dosageInstruction").cloned().unwrap_or_else(|| json!([])),
            "note": updated_notes
        });

        if let Err(e) = state.fhir.update("MedicationRequest", id, &payload).await {
            return Ok(failure_message(format!("Failed to update {id}: {e}")));
        }
        updated += 1;
    }

    Ok(success_message(format!(
        "{updated} medication(s) updated for tablet '{}'.",
        body.tablet_name
    )))
}

/// Flatten a MedicationRequest into the active-medication summary shape.
fn active_summary(resource: &Value) -> Value {
    let doses_taken = resource
        .get("note")
        .and_then(Value::as_array)
        .and_then(|notes| {
            notes
                .iter()
                .rev()
                .filter_map(|note| note.get("text").and_then(Value::as_str))
                .find_map(|text| match dose::decode_lenient(text) {
                    items if !items.is_empty() || text.trim() == "[]" => Some(items),
                    _ => None,
                })
        })
        .unwrap_or_default();

    json!({
        "id": resource.get("id"),
        "tablet_name": resource
            .pointer("/medicationCodeableConcept/text")
            .cloned()
            .unwrap_or_else(|| json!("Unknown")),
        "status": resource.get("status").cloned().unwrap_or_else(|| json!("unknown")),
        "dosage": resource.pointer("/dosageInstruction/0/text").cloned().unwrap_or_else(|| json!("")),
        "authoredOn": resource.get("authoredOn").cloned().unwrap_or_else(|| json!("")),
        "duration_days": resource.pointer("/dosageInstruction/0/timing/repeat/boundsDuration/value"),
        "doses_taken": doses_taken
    })
}
