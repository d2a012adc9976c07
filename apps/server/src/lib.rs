//! Care-plan adapter service.
//!
//! Translates the hospital's internal patient-care model (surgeries, consent
//! forms, checklists, bookings, billing, wearable metrics, medications,
//! rehabilitation, meals) into HL7 FHIR R4 resources and relays them to an
//! external FHIR repository, alongside payment-order and blob-upload
//! integrations. The external FHIR server is the system of record; nothing
//! is persisted locally.

pub mod api;
pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod fhir;
pub mod logging;
pub mod metrics;
pub mod services;
pub mod state;
pub mod workers;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
