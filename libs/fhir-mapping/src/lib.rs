//! Care-plan to FHIR R4 mapping.
//!
//! One pure function per hospital entity, each turning a validated inbound
//! model plus the patient's UHID into a FHIR resource or a transaction
//! Bundle of `{resource, request}` entries. No I/O happens here; the server
//! crate owns transport.
//!
//! Cross-resource correlation contract: every emitted resource carries an
//! identifier under [`UHID_SYSTEM`] and, where the resource type has a
//! patient reference, a `Patient/{uhid}` reference.

pub mod dose;
pub mod map;
pub mod models;

use serde_json::{json, Value};

/// Identifier system tying every resource back to the hospital patient.
pub const UHID_SYSTEM: &str = "https://hospital.com/uhid";

/// Secondary identifier system for invoice lookup on Account resources.
pub const INVOICE_SYSTEM: &str = "https://hospital.com/invoice";

/// Internal tag system discriminating consent content from consent status.
pub const TAG_SYSTEM: &str = "https://hospital.com/tags";

/// Extension URL prefix for fields with no standard FHIR element.
pub const EXTENSION_BASE: &str = "https://hospital.com/fhir/StructureDefinition";

const FHIR_BASE_PROFILE: &str = "http://hl7.org/fhir/StructureDefinition";

/// `identifier` entry carrying the UHID.
pub fn uhid_identifier(uhid: &str) -> Value {
    json!({"system": UHID_SYSTEM, "value": uhid})
}

/// `Patient/{uhid}` literal reference.
pub fn patient_reference(uhid: &str) -> Value {
    json!({"reference": format!("Patient/{uhid}")})
}

/// `meta` with the base profile for a resource type.
pub fn meta_profile(resource_type: &str) -> Value {
    json!({"profile": [format!("{FHIR_BASE_PROFILE}/{resource_type}")]})
}

/// `meta` with the base profile plus an internal discriminator tag.
pub fn meta_tagged(resource_type: &str, tag: &str) -> Value {
    json!({
        "profile": [format!("{FHIR_BASE_PROFILE}/{resource_type}")],
        "tag": [{"system": TAG_SYSTEM, "code": tag}]
    })
}

/// Wrap a resource as a transaction-bundle POST entry.
pub fn post_entry(resource: Value, url: &str) -> Value {
    json!({"resource": resource, "request": {"method": "POST", "url": url}})
}

/// Assemble entries into a `Bundle` of type `transaction`.
pub fn transaction_bundle(entries: Vec<Value>) -> Value {
    json!({"resourceType": "Bundle", "type": "transaction", "entry": entries})
}
