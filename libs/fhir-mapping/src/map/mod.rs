//! Entity-by-entity FHIR mappers.

mod appointment;
mod billing;
mod consent;
mod documents;
mod meals;
mod medication;
mod patient;
mod rehab;
mod surgery;
mod watch;

pub use appointment::slot_booking_resource;
pub use billing::billing_resource;
pub use consent::{consent_form_bundle, consent_status_bundle, consent_status_code, permit_deny};
pub use documents::{checklist_bundle, document_resource};
pub use meals::{meal_order, meals_bundle};
pub use medication::{medication_bundle, medication_request};
pub use patient::{patient_bundle, patient_resource};
pub use rehab::{exercise_task, instruction_observation};
pub use surgery::surgery_bundle;
pub use watch::watch_bundle;
