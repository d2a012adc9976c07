//! End-to-end tests for the care-plan endpoints, driven through the real
//! router against a mock upstream.

mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::TestApp;

#[tokio::test]
async fn patient_conversion_echoes_bundle() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/fhir/patient", json!({"uhid": "UHID123456"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resourceType"], "Bundle");
    assert_eq!(body["type"], "transaction");
    assert_eq!(body["entry"][0]["resource"]["id"], "UHID123456");

    // Pure conversion: nothing goes to the FHIR server (the only upstream
    // traffic is the startup container check).
    assert!(app
        .upstream
        .requests()
        .iter()
        .all(|r| r.path.starts_with("/profile-picture")));
}

#[tokio::test]
async fn patient_conversion_rejects_empty_uhid() {
    let app = TestApp::new().await;
    let (status, body) = app.post("/fhir/patient", json!({"uhid": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn surgery_post_sends_transaction_bundle() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/fhir/surgery?uhid=UHID1",
            json!([{
                "surgery_id": "SURG-001",
                "surgery_type": "Total Knee Replacement",
                "video_link": "https://hospital.com/videos/knee"
            }]),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "FHIR resources posted successfully.");

    let requests = app.upstream.requests();
    let transaction = requests
        .iter()
        .find(|r| r.method == "POST" && r.path == "/")
        .expect("transaction bundle posted to the server root");
    assert_eq!(transaction.body["resourceType"], "Bundle");
    // Patient entry plus one Procedure entry.
    assert_eq!(transaction.body["entry"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn surgery_post_reports_upstream_failure() {
    let app = TestApp::new().await;
    app.upstream.enqueue(
        "POST",
        "/",
        422,
        json!({"resourceType": "OperationOutcome"}),
    );

    let (status, body) = app
        .post(
            "/fhir/surgery?uhid=UHID1",
            json!([{"surgery_id": "S1", "surgery_type": "Arthroscopy"}]),
        )
        .await;

    // Upstream errors surface in the envelope, not as an HTTP error.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("422"), "message was: {message}");
}

#[tokio::test]
async fn procedures_lookup_reports_empty_result() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/fhir/procedures/UHID9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No Procedures found for UHID UHID9");
}

#[tokio::test]
async fn consent_status_fetch_returns_latest_by_datetime() {
    let app = TestApp::new().await;

    let tag = |code: &str| json!({"tag": [{"system": "https://hospital.com/tags", "code": code}]});
    app.upstream.enqueue(
        "GET",
        "/Consent",
        200,
        json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {
                    "resourceType": "Consent", "id": "older",
                    "dateTime": "2025-01-01T00:00:00", "meta": tag("ConsentFormStatus")
                }},
                {"resource": {
                    "resourceType": "Consent", "id": "newer",
                    "dateTime": "2025-01-02T00:00:00", "meta": tag("ConsentFormStatus")
                }},
                {"resource": {
                    "resourceType": "Consent", "id": "form-data",
                    "dateTime": "2025-06-01T00:00:00", "meta": tag("ConsentFormData")
                }}
            ]
        }),
    );

    let (status, body) = app.get("/fhir/consent-form-status/UHID1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "newer");
}

#[tokio::test]
async fn consent_status_fetch_404s_when_tag_missing() {
    let app = TestApp::new().await;

    // Consents exist, but none carry the status tag.
    app.upstream.enqueue(
        "GET",
        "/Consent",
        200,
        json!({
            "resourceType": "Bundle",
            "entry": [{"resource": {
                "resourceType": "Consent", "id": "c1",
                "meta": {"tag": [{"system": "https://hospital.com/tags", "code": "ConsentFormData"}]}
            }}]
        }),
    );

    let (status, body) = app.get("/fhir/consent-form-status/UHID1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn consent_status_post_round_trips() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/fhir/consent-form-status?uhid=UHID1",
            json!({
                "status": 1,
                "status_timestamp": "2025-10-26T09:30:00",
                "approval": 1,
                "approval_timestamp": "2025-10-26T09:35:00",
                "validation": 1,
                "validation_timestamp": "2025-10-26T09:45:00",
                "document_url": "https://hospital.com/uploads/consent.pdf",
                "document_creation": "2025-10-26T09:40:00"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let posted = app
        .upstream
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.path == "/Consent")
        .expect("Consent posted");
    assert_eq!(posted.body["status"], "active");
    assert_eq!(posted.body["meta"]["tag"][0]["code"], "ConsentFormStatus");
}

#[tokio::test]
async fn checklist_delete_with_no_match_issues_no_deletes() {
    let app = TestApp::new().await;

    let (status, body) = app
        .delete("/fhir/preop-checklist/delete?uhid=UHID1&document_name=Blood%20Report")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "No document found for 'Blood Report' and UHID 'UHID1'."
    );
    assert_eq!(app.upstream.count("DELETE", "/DocumentReference"), 0);
}

#[tokio::test]
async fn checklist_delete_removes_each_match() {
    let app = TestApp::new().await;
    app.upstream.enqueue(
        "GET",
        "/DocumentReference",
        200,
        json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"resourceType": "DocumentReference", "id": "doc-1",
                              "type": {"text": "Blood Report"}}},
                {"resource": {"resourceType": "DocumentReference", "id": "doc-2",
                              "type": {"text": "Blood Report"}}}
            ]
        }),
    );

    let (status, body) = app
        .delete("/fhir/preop-checklist/delete?uhid=UHID1&document_name=Blood%20Report")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Deleted 2 document(s) successfully.");
    assert_eq!(app.upstream.count("DELETE", "/DocumentReference/"), 2);
}

#[tokio::test]
async fn checklist_update_single_puts_first_match() {
    let app = TestApp::new().await;
    app.upstream.enqueue(
        "GET",
        "/DocumentReference",
        200,
        json!({
            "resourceType": "Bundle",
            "entry": [{"resource": {"resourceType": "DocumentReference", "id": "doc-7",
                                     "type": {"text": "X-Ray"}}}]
        }),
    );

    let (status, body) = app
        .put(
            "/fhir/preop-checklist/update-single?uhid=UHID1",
            json!({
                "document_name": "X-Ray",
                "document_link": "https://hospital.com/docs/xray-v2.pdf",
                "assigned_by": "Dr. Smith",
                "assigned_timestamp": "2025-10-03T10:00:00",
                "updated_by": "Dr. Jones",
                "updated_timestamp": "2025-10-05T09:00:00"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["document_id"], "doc-7");

    let update = app
        .upstream
        .requests()
        .into_iter()
        .find(|r| r.method == "PUT" && r.path == "/DocumentReference/doc-7")
        .expect("document updated");
    assert_eq!(update.body["id"], "doc-7");
    assert_eq!(
        update.body["content"][0]["attachment"]["url"],
        "https://hospital.com/docs/xray-v2.pdf"
    );
}

#[tokio::test]
async fn slot_booking_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/fhir/slot-booking?uhid=UHID1",
            json!({
                "date": "2025-10-10",
                "time": "09:30:00",
                "booking_timestamp": "2025-10-01T14:00:00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let posted = app
        .upstream
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.path == "/Appointment")
        .expect("appointment posted");
    assert_eq!(posted.body["start"], "2025-10-10T09:30:00");
    assert_eq!(posted.body["created"], "2025-10-01T14:00:00");
}

#[tokio::test]
async fn slot_booking_fetch_skips_incomplete_entries() {
    let app = TestApp::new().await;
    app.upstream.enqueue(
        "GET",
        "/Appointment",
        200,
        json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"resourceType": "Appointment", "id": "a1",
                              "start": "2025-10-10T09:30:00",
                              "description": "Surgery Slot Booking",
                              "created": "2025-10-01T14:00:00",
                              "participant": [{"actor": {"reference": "Patient/UHID1"},
                                                "status": "accepted"}]}},
                {"resource": {"resourceType": "Appointment", "id": "incomplete"}}
            ]
        }),
    );

    let (status, body) = app.get("/fhir/slot-booking?uhid=UHID1").await;
    assert_eq!(status, StatusCode::OK);
    let appointments = body["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["participants"][0], "Patient/UHID1");
}

#[tokio::test]
async fn billing_fetch_extracts_invoice_identifiers() {
    let app = TestApp::new().await;
    app.upstream.enqueue(
        "GET",
        "/Account",
        200,
        json!({
            "resourceType": "Bundle",
            "entry": [{"resource": {
                "resourceType": "Account",
                "identifier": [
                    {"system": "https://hospital.com/uhid", "value": "UHID1"},
                    {"system": "https://hospital.com/invoice", "value": "INV-2025-1001"}
                ]
            }}]
        }),
    );

    let (status, body) = app.get("/fhir/billing?uhid=UHID1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoices"], json!(["INV-2025-1001"]));
}

#[tokio::test]
async fn watch_data_fans_out_one_observation_per_metric() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/fhir/watch-data?uhid=UHID1",
            json!({
                "yearly": [
                    {"timestamp": "2025-01-01T00:00:00", "sleep_time": 7.5,
                     "heart_rate": 72, "step_count": 10000}
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "3 Observations posted successfully.");
    assert_eq!(app.upstream.count("POST", "/Observation"), 3);
}

#[tokio::test]
async fn watch_data_with_no_metrics_posts_nothing() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/fhir/watch-data?uhid=UHID1",
            json!({"daily": [{"timestamp": "2025-01-01T00:00:00"}]}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "0 Observations posted successfully.");
    assert_eq!(app.upstream.count("POST", "/Observation"), 0);
}

#[tokio::test]
async fn exercises_round_trip_through_task_notes() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/rehab/exercises?uhid=UHID1",
            json!([{
                "name": "Leg Raise",
                "reps": 10,
                "sets": 3,
                "difficulty": "medium",
                "progress_percentage": 40.0,
                "assigned_date": "2025-10-03",
                "assigned_time": "08:30:00",
                "duration_days": 14,
                "schedule": "daily",
                "period": "morning",
                "exercise_video": "https://hospital.com/videos/leg-raise"
            }]),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "1 exercise(s) posted successfully.");

    let posted = app
        .upstream
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.path == "/Task")
        .expect("task posted");

    // Read back through the reshaping endpoint.
    app.upstream.enqueue(
        "GET",
        "/Task",
        200,
        json!({"resourceType": "Bundle", "entry": [{"resource": posted.body}]}),
    );

    let (status, body) = app.get("/rehab/exercises?uhid=UHID1").await;
    assert_eq!(status, StatusCode::OK);
    let exercise = &body["exercises"][0];
    assert_eq!(exercise["progress_percentage"], 40.0);
    assert_eq!(exercise["duration_days"], 14);
    assert_eq!(exercise["exercise_video"], "https://hospital.com/videos/leg-raise");
}

#[tokio::test]
async fn delete_exercise_only_touches_in_progress_tasks() {
    let app = TestApp::new().await;
    app.upstream.enqueue(
        "GET",
        "/Task",
        200,
        json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"resourceType": "Task", "id": "t1", "status": "in-progress",
                              "description": "Leg Raise - 10 reps x 3 sets (medium)"}},
                {"resource": {"resourceType": "Task", "id": "t2", "status": "completed",
                              "description": "Leg Raise - 10 reps x 3 sets (medium)"}}
            ]
        }),
    );

    let (status, body) = app
        .delete("/rehab/exercises?uhid=UHID1&exercise_name=leg%20raise")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(app.upstream.count("DELETE", "/Task/t1"), 1);
    assert_eq!(app.upstream.count("DELETE", "/Task/t2"), 0);
}

#[tokio::test]
async fn meals_post_and_fetch() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/fhir/meals?uhid=UHID1",
            json!({"meals": [{
                "meal_name": "Breakfast",
                "description": "Oats with fruits and milk",
                "period": "breakfast",
                "assigned_date": "2025-10-03",
                "assigned_time": "08:00:00"
            }]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "1 meal(s) posted successfully.");

    let posted = app
        .upstream
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.path == "/NutritionOrder")
        .expect("nutrition order posted");

    app.upstream.enqueue(
        "GET",
        "/NutritionOrder",
        200,
        json!({"resourceType": "Bundle", "entry": [{"resource": posted.body}]}),
    );

    let (status, body) = app.get("/fhir/meals?uhid=UHID1").await;
    assert_eq!(status, StatusCode::OK);
    let meal = &body["meals"][0];
    assert_eq!(meal["period"], "breakfast");
    assert_eq!(meal["description"], "Oats with fruits and milk");
    assert_eq!(meal["dateTime"], "2025-10-03T08:00:00");
}
