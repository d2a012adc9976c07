//! Billing endpoints.

use super::{failure_message, require_uhid, success_message, UhidQuery};
use crate::{fhir, state::AppState, Result};
use axum::{
    extract::{Query, State},
    Json,
};
use pons_mapping::{map, models::BillingInfo, INVOICE_SYSTEM};
use serde_json::{json, Value};
use validator::Validate;

/// Convert billing info to a FHIR Account and post it.
pub async fn post_billing(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(billing): Json<BillingInfo>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    billing.validate()?;

    let resource = map::billing_resource(&query.uhid, &billing);
    match state.fhir.create("Account", &resource).await {
        Ok(_) => Ok(success_message("Billing Account posted successfully.")),
        Err(e) => Ok(failure_message(e.to_string())),
    }
}

/// Invoice numbers for a patient, pulled from the Account identifiers.
pub async fn get_billing(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let patient = fhir::subject_query(&query.uhid);
    match state.fhir.search("Account", &[("patient", patient.as_str())]).await {
        Ok(data) => {
            let invoices: Vec<Value> = fhir::entry_resources(&data)
                .iter()
                .flat_map(|resource| {
                    resource
                        .get("identifier")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default()
                })
                .filter(|identifier| {
                    identifier.get("system").and_then(Value::as_str) == Some(INVOICE_SYSTEM)
                })
                .filter_map(|identifier| identifier.get("value").cloned())
                .collect();

            Ok(Json(json!({"invoices": invoices})))
        }
        Err(e) => Ok(Json(json!({"invoices": [], "error": e.to_string()}))),
    }
}
