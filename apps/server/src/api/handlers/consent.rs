//! Consent form endpoints.
//!
//! Content and lifecycle status are both stored as Consent resources and
//! distinguished by the internal `meta.tag` code; the read paths filter on
//! that tag and return the latest record by `dateTime`.

use super::{post_entries_individually, require_uhid, UhidQuery};
use crate::{fhir, state::AppState, Error, Result};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use pons_mapping::{
    map,
    models::{ConsentFormData, ConsentFormStatus},
};
use serde_json::{json, Value};
use validator::Validate;

/// Convert a ConsentFormStatus to a tagged FHIR Consent and post it.
pub async fn post_status(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(status): Json<ConsentFormStatus>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    status.validate()?;

    let bundle = map::consent_status_bundle(&query.uhid, &status);
    Ok(post_entries_individually(
        &state,
        "Consent",
        &bundle,
        "Consent form status posted successfully.",
    )
    .await)
}

/// Convert structured ConsentFormData to a tagged FHIR Consent and post it.
pub async fn post_form(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(form): Json<ConsentFormData>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    form.validate()?;

    let bundle = map::consent_form_bundle(&query.uhid, &form, Utc::now().naive_utc());
    Ok(post_entries_individually(
        &state,
        "Consent",
        &bundle,
        "Structured consent form posted successfully.",
    )
    .await)
}

/// Latest ConsentFormStatus record for a patient.
pub async fn get_status(
    State(state): State<AppState>,
    Path(uhid): Path<String>,
) -> Result<Json<Value>> {
    latest_tagged_consent(&state, &uhid, "ConsentFormStatus").await
}

/// Latest structured ConsentFormData record for a patient.
pub async fn get_form(
    State(state): State<AppState>,
    Path(uhid): Path<String>,
) -> Result<Json<Value>> {
    latest_tagged_consent(&state, &uhid, "ConsentFormData").await
}

async fn latest_tagged_consent(state: &AppState, uhid: &str, tag: &str) -> Result<Json<Value>> {
    require_uhid(uhid)?;

    let identifier = fhir::identifier_query(uhid);
    let data = state
        .fhir
        .search("Consent", &[("identifier", identifier.as_str())])
        .await?;

    let resources = fhir::entry_resources(&data);
    if resources.is_empty() {
        return Err(Error::NotFound(format!("No Consent found for UHID {uhid}")));
    }

    let tagged: Vec<Value> = resources
        .into_iter()
        .filter(|resource| fhir::has_tag(resource, tag))
        .collect();

    let latest = fhir::latest_by_datetime(tagged)
        .ok_or_else(|| Error::NotFound(format!("No {tag} found for UHID {uhid}")))?;

    Ok(Json(json!({"success": true, "data": latest})))
}
