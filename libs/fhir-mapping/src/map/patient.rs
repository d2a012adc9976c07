//! Patient mapping.

use crate::models::PatientLogin;
use crate::{meta_profile, post_entry, transaction_bundle, uhid_identifier};
use serde_json::{json, Value};

/// Bare FHIR Patient keyed by the UHID.
pub fn patient_resource(uhid: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "id": uhid,
        "identifier": [uhid_identifier(uhid)],
        "active": true,
        "meta": meta_profile("Patient")
    })
}

/// Patient inside a transaction Bundle, as echoed to the login flow.
pub fn patient_bundle(login: &PatientLogin) -> Value {
    transaction_bundle(vec![post_entry(patient_resource(&login.uhid), "Patient")])
}
