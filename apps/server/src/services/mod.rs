//! Clients for the non-FHIR collaborators: the payment gateway and blob
//! storage.

pub mod blobs;
pub mod payments;
