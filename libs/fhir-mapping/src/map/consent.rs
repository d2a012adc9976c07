//! Consent mapping.
//!
//! Both the structured form content and its lifecycle record are stored as
//! FHIR Consent resources on the same server; they are told apart at read
//! time by the internal `meta.tag` code (`ConsentFormData` vs
//! `ConsentFormStatus`). Fields with no standard Consent element ride along
//! as extensions under [`crate::EXTENSION_BASE`].

use crate::models::{timestamp, ConsentFormData, ConsentFormStatus};
use crate::{
    meta_tagged, patient_reference, post_entry, transaction_bundle, uhid_identifier,
    EXTENSION_BASE,
};
use chrono::NaiveDateTime;
use serde_json::{json, Value};

/// Numeric consent status to the FHIR Consent status vocabulary.
///
/// Unknown codes are tolerated and fall back to `draft`; the ward app has
/// shipped out-of-range values before and a hard failure here loses the
/// whole submission.
pub fn consent_status_code(code: i32) -> &'static str {
    match code {
        1 => "active",
        2 => "rejected",
        _ => "draft",
    }
}

/// Numeric validation/approval code to the permit/deny vocabulary.
pub fn permit_deny(code: i32) -> &'static str {
    if code == 1 {
        "permit"
    } else {
        "deny"
    }
}

fn scope() -> Value {
    json!({
        "coding": [{
            "system": "http://terminology.hl7.org/CodeSystem/consentscope",
            "code": "patient-privacy"
        }]
    })
}

fn ext_datetime(name: &str, value: NaiveDateTime) -> Value {
    json!({
        "url": format!("{EXTENSION_BASE}/{name}"),
        "valueDateTime": value.format(timestamp::FORMAT).to_string()
    })
}

/// Lifecycle record as a tagged Consent inside a transaction Bundle.
pub fn consent_status_bundle(uhid: &str, status: &ConsentFormStatus) -> Value {
    let mut extensions = vec![
        json!({
            "url": format!("{EXTENSION_BASE}/consent-approval"),
            "valueCode": permit_deny(status.approval)
        }),
        ext_datetime("consent-approval-timestamp", status.approval_timestamp),
        ext_datetime("consent-status-timestamp", status.status_timestamp),
        ext_datetime("consent-validation-timestamp", status.validation_timestamp),
    ];
    if status.document_url.is_some() {
        extensions.push(ext_datetime("document-creation", status.document_creation));
    }

    let mut consent = json!({
        "resourceType": "Consent",
        "identifier": [uhid_identifier(uhid)],
        "status": consent_status_code(status.status),
        "scope": scope(),
        "category": [{"text": "Surgical Consent"}],
        "patient": patient_reference(uhid),
        "dateTime": status.approval_timestamp.format(timestamp::FORMAT).to_string(),
        "policyRule": {"text": "Hospital Terms & Conditions"},
        "provision": {"type": permit_deny(status.validation)},
        "extension": extensions,
        "meta": meta_tagged("Consent", "ConsentFormStatus")
    });

    if let Some(url) = &status.document_url {
        consent["sourceAttachment"] = json!({
            "url": url,
            "creation": status.document_creation.format(timestamp::FORMAT).to_string()
        });
    }

    transaction_bundle(vec![post_entry(consent, "Consent")])
}

/// Structured form content as a tagged Consent inside a transaction Bundle.
///
/// The section payload has no FHIR-native home, so it is carried verbatim as
/// a JSON string in one extension, the same trick the dose calendar uses on
/// MedicationRequest notes. `recorded` is the submission instant (passed in
/// to keep the mapper deterministic) and doubles as the `dateTime` used by
/// the latest-wins read path.
pub fn consent_form_bundle(uhid: &str, form: &ConsentFormData, recorded: NaiveDateTime) -> Value {
    let display = format!(
        "{} {}",
        form.basic_details.first_name, form.basic_details.last_name
    );
    let payload =
        serde_json::to_string(form).expect("consent form content serializes infallibly");

    let consent = json!({
        "resourceType": "Consent",
        "identifier": [uhid_identifier(uhid)],
        "status": "active",
        "scope": scope(),
        "category": [{"text": "Surgical Consent"}],
        "patient": {"reference": format!("Patient/{uhid}"), "display": display},
        "dateTime": recorded.format(timestamp::FORMAT).to_string(),
        "policyRule": {"text": "Hospital Terms & Conditions"},
        "extension": [{
            "url": format!("{EXTENSION_BASE}/consent-form-data"),
            "valueString": payload
        }],
        "meta": meta_tagged("Consent", "ConsentFormData")
    });

    transaction_bundle(vec![post_entry(consent, "Consent")])
}
