//! Pre-op checklist endpoints.

use super::{failure_message, post_entries_individually, require_uhid, UhidQuery};
use crate::{fhir, state::AppState, Result};
use axum::{
    extract::{Query, State},
    Json,
};
use pons_mapping::{
    map,
    models::{DocumentEntry, PreOpChecklist},
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub uhid: String,
    pub document_name: String,
}

/// Convert the checklist to DocumentReference resources and post each one.
pub async fn post_checklist(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(checklist): Json<PreOpChecklist>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    checklist.validate()?;

    let bundle = map::checklist_bundle(&query.uhid, &checklist);
    Ok(post_entries_individually(
        &state,
        "DocumentReference",
        &bundle,
        "All DocumentReference resources posted successfully.",
    )
    .await)
}

/// Complete checklist for a patient, reshaped back into document entries.
pub async fn get_checklist(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let subject = fhir::subject_query(&query.uhid);
    match state
        .fhir
        .search("DocumentReference", &[("subject", subject.as_str())])
        .await
    {
        Ok(data) => {
            let documents: Vec<Value> = fhir::entry_resources(&data)
                .iter()
                .map(document_summary)
                .collect();
            Ok(Json(json!({"success": true, "documents": documents})))
        }
        Err(e) => Ok(failure_message(e.to_string())),
    }
}

/// Delete every DocumentReference matching UHID and document name.
///
/// Zero matches is a reported failure and performs no delete calls.
pub async fn delete_document(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let subject = fhir::subject_query(&query.uhid);
    let data = match state
        .fhir
        .search(
            "DocumentReference",
            &[("subject", subject.as_str()), ("type:text", query.document_name.as_str())],
        )
        .await
    {
        Ok(data) => data,
        Err(e) => return Ok(failure_message(format!("FHIR search error: {e}"))),
    };

    let resources = fhir::entry_resources(&data);
    if resources.is_empty() {
        return Ok(failure_message(format!(
            "No document found for '{}' and UHID '{}'.",
            query.document_name, query.uhid
        )));
    }

    let mut deleted = Vec::new();
    for resource in &resources {
        let Some(id) = resource.get("id").and_then(Value::as_str) else {
            continue;
        };
        let name = resource.pointer("/type/text").and_then(Value::as_str);

        if let Err(e) = state.fhir.delete("DocumentReference", id).await {
            return Ok(failure_message(format!(
                "Failed to delete document {id}: {e}"
            )));
        }
        deleted.push(json!({"document_name": name, "document_id": id}));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Deleted {} document(s) successfully.", deleted.len()),
        "deleted": deleted
    })))
}

/// Update the first DocumentReference matching the entry's name with the
/// full new content.
pub async fn update_single_document(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(entry): Json<DocumentEntry>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    entry.validate()?;

    let subject = fhir::subject_query(&query.uhid);
    let data = match state
        .fhir
        .search(
            "DocumentReference",
            &[("subject", subject.as_str()), ("type:text", entry.document_name.as_str())],
        )
        .await
    {
        Ok(data) => data,
        Err(e) => return Ok(failure_message(format!("FHIR search error: {e}"))),
    };

    let resources = fhir::entry_resources(&data);
    let Some(id) = resources
        .first()
        .and_then(|resource| resource.get("id"))
        .and_then(Value::as_str)
    else {
        return Ok(failure_message(format!(
            "No document found for '{}' and UHID '{}'.",
            entry.document_name, query.uhid
        )));
    };

    let updated = map::document_resource(&query.uhid, &entry, Some(id));
    if let Err(e) = state.fhir.update("DocumentReference", id, &updated).await {
        return Ok(failure_message(format!(
            "Failed to update document {id}: {e}"
        )));
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Document '{}' updated successfully.", entry.document_name),
        "document_id": id
    })))
}

/// Reshape a DocumentReference back into the internal document-entry shape.
fn document_summary(resource: &Value) -> Value {
    let attachment = resource.pointer("/content/0/attachment");

    // The validation timestamp is encoded in the description line; "N/A"
    // means the document was never validated.
    let validation_timestamp = resource
        .get("description")
        .and_then(Value::as_str)
        .and_then(|text| text.strip_prefix("Validation Timestamp: "))
        .filter(|value| *value != "N/A")
        .map(str::to_string);

    let validated_by = resource
        .pointer("/authenticator/display")
        .and_then(Value::as_str)
        .filter(|display| *display != "N/A");

    json!({
        "document_name": resource.pointer("/type/text")
            .or_else(|| resource.get("description")),
        "document_link": attachment.and_then(|a| a.get("url")),
        "assigned_by": resource.pointer("/author/0/display"),
        "assigned_timestamp": attachment.and_then(|a| a.get("creation")),
        "validated_by": validated_by,
        "validation_timestamp": validation_timestamp,
        "updated_by": resource.pointer("/custodian/display"),
        "updated_timestamp": resource.get("date")
            .or_else(|| resource.pointer("/meta/lastUpdated"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_round_trips_mapper_output() {
        let entry = DocumentEntry {
            document_name: "Blood Sugar Report".into(),
            document_link: "https://hospital.com/docs/bs.pdf".into(),
            assigned_by: "Dr. Smith".into(),
            assigned_timestamp: chrono::NaiveDate::from_ymd_opt(2025, 10, 3)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            validated_by: Some("Nurse A".into()),
            validation_timestamp: Some(
                chrono::NaiveDate::from_ymd_opt(2025, 10, 3)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
            ),
            updated_by: "Dr. Smith".into(),
            updated_timestamp: chrono::NaiveDate::from_ymd_opt(2025, 10, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        };
        let resource = map::document_resource("UHID1", &entry, Some("doc-1"));
        let summary = document_summary(&resource);

        assert_eq!(summary["document_name"], "Blood Sugar Report");
        assert_eq!(summary["document_link"], "https://hospital.com/docs/bs.pdf");
        assert_eq!(summary["assigned_timestamp"], "2025-10-03T10:00:00");
        assert_eq!(summary["validated_by"], "Nurse A");
        assert_eq!(summary["validation_timestamp"], "2025-10-03T12:00:00");
        assert_eq!(summary["updated_timestamp"], "2025-10-04T09:00:00");
    }

    #[test]
    fn unvalidated_summary_has_null_validation() {
        let entry = DocumentEntry {
            document_name: "X-Ray".into(),
            document_link: "https://hospital.com/docs/xray.pdf".into(),
            assigned_by: "Dr. Smith".into(),
            assigned_timestamp: chrono::NaiveDate::from_ymd_opt(2025, 10, 3)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            validated_by: None,
            validation_timestamp: None,
            updated_by: "Dr. Smith".into(),
            updated_timestamp: chrono::NaiveDate::from_ymd_opt(2025, 10, 3)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        };
        let summary = document_summary(&map::document_resource("U1", &entry, None));
        assert_eq!(summary["validated_by"], Value::Null);
        assert_eq!(summary["validation_timestamp"], Value::Null);
    }
}
