//! Route tables, one per API area.

use crate::api::handlers::{
    billing, blobs, booking, checklist, consent, meals, medication, patient, payment, rehab,
    surgery, watch,
};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// Care-plan routes backed by the FHIR repository, nested under `/fhir`.
pub fn fhir_routes() -> Router<AppState> {
    Router::new()
        .route("/patient", post(patient::convert_patient))
        .route("/surgery", post(surgery::post_surgeries))
        .route("/procedures/:uhid", get(surgery::get_procedures))
        .route("/consent-form-status", post(consent::post_status))
        .route("/consent-form-status/:uhid", get(consent::get_status))
        .route("/consent-forms", post(consent::post_form))
        .route("/consent-form/:uhid", get(consent::get_form))
        .route(
            "/preop-checklist",
            post(checklist::post_checklist).get(checklist::get_checklist),
        )
        .route(
            "/preop-checklist/update-single",
            put(checklist::update_single_document),
        )
        .route("/preop-checklist/delete", delete(checklist::delete_document))
        .route(
            "/slot-booking",
            post(booking::post_slot_booking).get(booking::get_slot_bookings),
        )
        .route(
            "/billing",
            post(billing::post_billing).get(billing::get_billing),
        )
        .route(
            "/watch-data",
            post(watch::post_watch_data).get(watch::get_watch_data),
        )
        .route("/convert-medications", post(medication::convert_medications))
        .route(
            "/medications",
            post(medication::post_medications).get(medication::get_medications),
        )
        .route(
            "/medications/active/:uhid",
            get(medication::get_active_medications),
        )
        .route(
            "/medications/update-dose/:uhid",
            put(medication::update_dose_taken),
        )
        .route(
            "/delete-active-medicine",
            delete(medication::delete_active_medicine),
        )
        .route("/meals", post(meals::post_meals).get(meals::get_meals))
}

/// Rehabilitation routes, nested under `/rehab`.
pub fn rehab_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/exercises",
            post(rehab::post_exercises)
                .get(rehab::get_exercises)
                .delete(rehab::delete_exercise),
        )
        .route("/exercises/in-progress", get(rehab::get_in_progress_exercises))
        .route(
            "/instructions",
            post(rehab::post_instructions).get(rehab::get_instructions),
        )
}

/// Payment and blob bridge routes at the root.
pub fn integration_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(payment::create_order))
        .route("/verify-payment", post(payment::verify_payment))
        .route("/upload-image", post(blobs::upload_image))
        .route("/list-blobs", get(blobs::list_blobs))
}
