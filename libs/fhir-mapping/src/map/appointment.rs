//! Slot booking mapping.

use crate::models::{timestamp, SlotBooking};
use crate::{meta_profile, uhid_identifier};
use serde_json::{json, Value};

/// FHIR Appointment for a surgery slot.
///
/// `start` is the slot itself (date + time), `created` the instant the
/// booking was made.
pub fn slot_booking_resource(uhid: &str, slot: &SlotBooking) -> Value {
    json!({
        "resourceType": "Appointment",
        "identifier": [uhid_identifier(uhid)],
        "status": "booked",
        "description": "Surgery Slot Booking",
        "start": format!("{}T{}", slot.date, slot.time),
        "created": slot.booking_timestamp.format(timestamp::FORMAT).to_string(),
        "participant": [
            {"actor": {"reference": format!("Patient/{uhid}")}, "status": "accepted"}
        ],
        "meta": meta_profile("Appointment")
    })
}
