//! Slot booking endpoints.

use super::{failure_message, require_uhid, success_message, UhidQuery};
use crate::{fhir, state::AppState, Result};
use axum::{
    extract::{Query, State},
    Json,
};
use pons_mapping::{map, models::SlotBooking};
use serde_json::{json, Value};
use validator::Validate;

/// Convert a slot booking to a FHIR Appointment and post it.
pub async fn post_slot_booking(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(slot): Json<SlotBooking>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    slot.validate()?;

    let resource = map::slot_booking_resource(&query.uhid, &slot);
    match state.fhir.create("Appointment", &resource).await {
        Ok(_) => Ok(success_message("Appointment booked successfully.")),
        Err(e) => Ok(failure_message(e.to_string())),
    }
}

/// Appointments for a patient, reshaped. Entries without a start or
/// description are incomplete bookings and are skipped.
pub async fn get_slot_bookings(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let identifier = fhir::identifier_query(&query.uhid);
    match state
        .fhir
        .search("Appointment", &[("identifier", identifier.as_str())])
        .await
    {
        Ok(data) => {
            let appointments: Vec<Value> = fhir::entry_resources(&data)
                .iter()
                .filter(|resource| {
                    resource.get("start").is_some() && resource.get("description").is_some()
                })
                .map(|resource| {
                    let participants: Vec<Value> = resource
                        .get("participant")
                        .and_then(Value::as_array)
                        .map(|participants| {
                            participants
                                .iter()
                                .map(|p| {
                                    p.pointer("/actor/display")
                                        .or_else(|| p.pointer("/actor/reference"))
                                        .cloned()
                                        .unwrap_or(Value::Null)
                                })
                                .collect()
                        })
                        .unwrap_or_default();

                    json!({
                        "start": resource.get("start"),
                        "description": resource.get("description"),
                        "created": resource.get("created"),
                        "participants": participants
                    })
                })
                .collect();

            Ok(Json(json!({"appointments": appointments})))
        }
        Err(e) => Ok(Json(json!({"appointments": [], "error": e.to_string()}))),
    }
}
