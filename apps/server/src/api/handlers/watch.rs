//! Wearable metric endpoints.

use super::{require_uhid, success_message, UhidQuery};
use crate::{fhir, state::AppState, Result};
use axum::{
    extract::{Query, State},
    Json,
};
use pons_mapping::{map, models::WatchData};
use serde_json::{json, Value};

/// Convert watch metrics to Observations and post each one.
pub async fn post_watch_data(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(watch): Json<WatchData>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let bundle = map::watch_bundle(&query.uhid, &watch);
    let resources = fhir::entry_resources(&bundle);
    let total = resources.len();

    for (index, resource) in resources.iter().enumerate() {
        if let Err(e) = state.fhir.create("Observation", resource).await {
            return Ok(Json(json!({
                "success": false,
                "message": format!("Error posting Observation: {e}"),
                "posted": index,
                "failed_entry": index
            })));
        }
    }

    Ok(success_message(format!(
        "{total} Observations posted successfully."
    )))
}

/// Watch Observations for a patient, reshaped into flat metric entries.
pub async fn get_watch_data(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let subject = fhir::subject_query(&query.uhid);
    match state
        .fhir
        .search("Observation", &[("subject", subject.as_str())])
        .await
    {
        Ok(data) => {
            let observations: Vec<Value> = fhir::entry_resources(&data)
                .iter()
                .map(|resource| {
                    let categories: Vec<Value> = resource
                        .get("category")
                        .and_then(Value::as_array)
                        .map(|categories| {
                            categories
                                .iter()
                                .map(|c| c.get("text").cloned().unwrap_or(Value::Null))
                                .collect()
                        })
                        .unwrap_or_default();

                    json!({
                        "code": resource.pointer("/code/text"),
                        "value": resource.pointer("/valueQuantity/value"),
                        "unit": resource.pointer("/valueQuantity/unit"),
                        "category": categories,
                        "timestamp": resource.get("effectiveDateTime")
                    })
                })
                .collect();

            Ok(Json(json!({"success": true, "observations": observations})))
        }
        Err(e) => Ok(Json(json!({
            "success": false,
            "observations": [],
            "error": e.to_string()
        }))),
    }
}
