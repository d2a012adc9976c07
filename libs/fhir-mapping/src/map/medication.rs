//! Tablet prescription mapping.

use crate::dose;
use crate::models::{TabletPrescribed, TabletPrescriptionEntry};
use crate::{meta_profile, patient_reference, post_entry, transaction_bundle, uhid_identifier};
use serde_json::{json, Value};

/// Single MedicationRequest for a prescribed tablet.
///
/// The dose calendar is serialized into `note[0].text` (see [`crate::dose`]),
/// the planned duration into `boundsDuration`, and everything the patient
/// needs to read back into the dosage instruction text.
pub fn medication_request(uhid: &str, tablet: &TabletPrescriptionEntry) -> Value {
    let food = if tablet.before_food {
        "before food"
    } else {
        "after food"
    };

    json!({
        "resourceType": "MedicationRequest",
        "identifier": [uhid_identifier(uhid)],
        "status": if tablet.completed == 0 { "active" } else { "completed" },
        "intent": "order",
        "subject": patient_reference(uhid),
        "authoredOn": format!("{}T00:00:00", tablet.prescribed_date),
        "medicationCodeableConcept": {"text": tablet.tablet_name},
        "dosageInstruction": [{
            "text": format!(
                "{}, Schedule: {}, {food}",
                tablet.dosage, tablet.schedule_pattern
            ),
            "timing": {
                "repeat": {
                    "boundsDuration": {
                        "value": tablet.duration_days,
                        "unit": "days",
                        "system": "http://unitsofmeasure.org",
                        "code": "d"
                    }
                }
            }
        }],
        "note": [{"text": dose::encode(&tablet.doses_taken)}],
        "meta": meta_profile("MedicationRequest")
    })
}

/// All prescribed tablets as a transaction Bundle.
pub fn medication_bundle(uhid: &str, prescribed: &TabletPrescribed) -> Value {
    let entries = prescribed
        .tablets
        .iter()
        .map(|tablet| post_entry(medication_request(uhid, tablet), "MedicationRequest"))
        .collect();
    transaction_bundle(entries)
}
