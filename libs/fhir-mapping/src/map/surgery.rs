//! Surgery mapping: one Procedure per surgery, bundled with the Patient.

use crate::models::{timestamp, SurgeryDetails};
use crate::{map::patient_resource, meta_profile, patient_reference, post_entry, transaction_bundle, uhid_identifier};
use chrono::NaiveDateTime;
use serde_json::{json, Value};

/// Transaction Bundle of the Patient plus a completed Procedure per surgery.
///
/// `performed` is the mapping instant; callers pass the current time so the
/// function itself stays deterministic.
pub fn surgery_bundle(uhid: &str, surgeries: &[SurgeryDetails], performed: NaiveDateTime) -> Value {
    let mut entries = vec![post_entry(patient_resource(uhid), "Patient")];

    for surgery in surgeries {
        let video = surgery.video_link.as_deref().unwrap_or("N/A");
        let content = surgery.content_link.as_deref().unwrap_or("N/A");

        let procedure = json!({
            "resourceType": "Procedure",
            "id": surgery.surgery_id,
            "identifier": [uhid_identifier(uhid)],
            "status": "completed",
            "category": {
                "coding": [{
                    "system": "http://snomed.info/sct",
                    "code": "387713003",
                    "display": "Surgical procedure"
                }]
            },
            "code": {"text": surgery.surgery_type},
            "subject": patient_reference(uhid),
            "performedDateTime": performed.format(timestamp::FORMAT).to_string(),
            "note": [
                {"text": format!("Video: {video}")},
                {"text": format!("Content: {content}")}
            ],
            "meta": meta_profile("Procedure")
        });
        entries.push(post_entry(procedure, "Procedure"));
    }

    transaction_bundle(entries)
}
