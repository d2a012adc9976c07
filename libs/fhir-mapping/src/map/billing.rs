//! Billing mapping: an Account keyed by both UHID and invoice number.

use crate::models::BillingInfo;
use crate::{meta_profile, patient_reference, uhid_identifier, INVOICE_SYSTEM};
use serde_json::{json, Value};

pub fn billing_resource(uhid: &str, billing: &BillingInfo) -> Value {
    json!({
        "resourceType": "Account",
        "identifier": [
            uhid_identifier(uhid),
            {"system": INVOICE_SYSTEM, "value": billing.invoice_number}
        ],
        "status": "active",
        "name": format!("Invoice {}", billing.invoice_number),
        "subject": [patient_reference(uhid)],
        "meta": meta_profile("Account")
    })
}
