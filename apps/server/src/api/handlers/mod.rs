//! Request handlers, one module per care-plan area.
//!
//! Response envelope convention: `{"success": bool, "message"?, <data>?}`.
//! Upstream failures on write paths come back as a `success:false` envelope
//! carrying the upstream status and body in `message`; a handful of read
//! paths (consent lookups, active-medicine delete) propagate typed errors
//! and surface as HTTP 404/4xx/5xx instead.

pub mod billing;
pub mod blobs;
pub mod booking;
pub mod checklist;
pub mod consent;
pub mod meals;
pub mod medication;
pub mod patient;
pub mod payment;
pub mod rehab;
pub mod surgery;
pub mod watch;

use crate::{fhir, state::AppState, Error, Result};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

/// `?uhid=` query carried by most routes.
#[derive(Debug, Deserialize)]
pub struct UhidQuery {
    pub uhid: String,
}

pub(crate) fn require_uhid(uhid: &str) -> Result<()> {
    if uhid.trim().is_empty() {
        return Err(Error::Validation("uhid must not be empty".to_string()));
    }
    Ok(())
}

pub(crate) fn success_message(message: impl Into<String>) -> Json<Value> {
    Json(json!({"success": true, "message": message.into()}))
}

pub(crate) fn failure_message(message: impl Into<String>) -> Json<Value> {
    Json(json!({"success": false, "message": message.into()}))
}

/// POST every bundle entry to its own type endpoint, sequentially.
///
/// The upstream service rejects some transaction bundles outright, so
/// multi-entry writes degrade to one POST per entry. A failure stops the
/// loop; entries before it are already persisted upstream with no rollback,
/// so the envelope reports how many were posted and which entry failed,
/// letting callers reconcile.
pub(crate) async fn post_entries_individually(
    state: &AppState,
    resource_type: &str,
    bundle: &Value,
    success: impl Into<String>,
) -> Json<Value> {
    let resources = fhir::entry_resources(bundle);

    for (index, resource) in resources.iter().enumerate() {
        if let Err(e) = state.fhir.create(resource_type, resource).await {
            return Json(json!({
                "success": false,
                "message": e.to_string(),
                "posted": index,
                "failed_entry": index
            }));
        }
    }

    success_message(success)
}
