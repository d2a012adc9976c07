//! Pre-op checklist mapping: one DocumentReference per named document.

use crate::models::{timestamp, DocumentEntry, PreOpChecklist};
use crate::{meta_profile, patient_reference, post_entry, transaction_bundle, uhid_identifier};
use serde_json::{json, Value};

/// Single DocumentReference for a checklist document.
///
/// With `id` set the resource addresses an existing server record (used by
/// the update path); without it the resource is ready for a create.
pub fn document_resource(uhid: &str, doc: &DocumentEntry, id: Option<&str>) -> Value {
    let validation = match doc.validation_timestamp {
        Some(ts) => ts.format(timestamp::FORMAT).to_string(),
        None => "N/A".to_string(),
    };

    let mut resource = json!({
        "resourceType": "DocumentReference",
        "identifier": [uhid_identifier(uhid)],
        "status": "current",
        "type": {"text": doc.document_name},
        "subject": patient_reference(uhid),
        "author": [{"display": doc.assigned_by}],
        "authenticator": {"display": doc.validated_by.as_deref().unwrap_or("N/A")},
        "custodian": {"display": doc.updated_by},
        "date": doc.updated_timestamp.format(timestamp::FORMAT).to_string(),
        "description": format!("Validation Timestamp: {validation}"),
        "content": [{
            "attachment": {
                "url": doc.document_link,
                "title": doc.document_name,
                "creation": doc.assigned_timestamp.format(timestamp::FORMAT).to_string()
            }
        }],
        "meta": meta_profile("DocumentReference")
    });

    if let Some(id) = id {
        resource["id"] = json!(id);
    }
    resource
}

/// Whole checklist as a transaction Bundle.
pub fn checklist_bundle(uhid: &str, checklist: &PreOpChecklist) -> Value {
    let entries = checklist
        .documents
        .iter()
        .map(|doc| post_entry(document_resource(uhid, doc, None), "DocumentReference"))
        .collect();
    transaction_bundle(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn doc(validated: bool) -> DocumentEntry {
        let ts = NaiveDate::from_ymd_opt(2025, 10, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        DocumentEntry {
            document_name: "Blood Sugar Report".into(),
            document_link: "https://hospital.com/docs/blood-sugar.pdf".into(),
            assigned_by: "Dr. Smith".into(),
            assigned_timestamp: ts,
            validated_by: validated.then(|| "Nurse A".to_string()),
            validation_timestamp: validated.then(|| ts + chrono::Duration::hours(2)),
            updated_by: "Dr. Smith".into(),
            updated_timestamp: ts,
        }
    }

    #[test]
    fn maps_provenance_fields() {
        let resource = document_resource("UHID1", &doc(true), None);
        assert_eq!(resource["type"]["text"], "Blood Sugar Report");
        assert_eq!(resource["author"][0]["display"], "Dr. Smith");
        assert_eq!(resource["authenticator"]["display"], "Nurse A");
        assert_eq!(
            resource["description"],
            "Validation Timestamp: 2025-10-03T12:00:00"
        );
        assert_eq!(
            resource["content"][0]["attachment"]["creation"],
            "2025-10-03T10:00:00"
        );
        assert!(resource.get("id").is_none());
    }

    #[test]
    fn unvalidated_document_reads_na() {
        let resource = document_resource("UHID1", &doc(false), None);
        assert_eq!(resource["authenticator"]["display"], "N/A");
        assert_eq!(resource["description"], "Validation Timestamp: N/A");
    }

    #[test]
    fn update_form_carries_id() {
        let resource = document_resource("UHID1", &doc(true), Some("doc-42"));
        assert_eq!(resource["id"], "doc-42");
    }

    #[test]
    fn bundle_has_one_entry_per_document() {
        let checklist = PreOpChecklist {
            documents: vec![doc(true), doc(false)],
        };
        let bundle = checklist_bundle("UHID1", &checklist);
        assert_eq!(bundle["entry"].as_array().unwrap().len(), 2);
    }
}
