//! Medication auto-complete worker.
//!
//! Once a day, every MedicationRequest on the server is re-evaluated: an
//! active prescription whose planned duration has fully elapsed
//! (`today > authoredOn + duration_days - 1`) is PUT back with status
//! `completed`. The scan is idempotent: already-completed resources are
//! skipped, so a run that dies mid-loop is simply picked up by the next
//! day's run. Updates are last-write-wins with no version check; expected
//! concurrency on a single patient's record is effectively zero.

use crate::{fhir::FhirGateway, metrics, Result};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use pons_mapping::models::timestamp;
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::sleep;

pub struct AutoCompleteWorker {
    fhir: FhirGateway,
    hour: u32,
    minute: u32,
}

impl AutoCompleteWorker {
    pub fn new(fhir: FhirGateway, hour: u32, minute: u32) -> Self {
        Self { fhir, hour, minute }
    }

    /// Run forever, scanning once per day at the configured wall-clock time.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let delay = next_run_delay(Utc::now(), self.hour, self.minute);
            tracing::info!(
                next_run_in_secs = delay.as_secs(),
                "Medication auto-complete scheduled"
            );

            tokio::select! {
                _ = sleep(delay) => {
                    let today = Utc::now().date_naive();
                    match self.run_once(today).await {
                        Ok(completed) => {
                            tracing::info!(completed, "Medication auto-complete finished");
                        }
                        Err(e) => {
                            metrics::AUTO_COMPLETE_TOTAL
                                .with_label_values(&["run_failed"])
                                .inc();
                            tracing::error!(error = %e, "Medication auto-complete failed");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("Medication auto-complete worker shutting down");
                    return;
                }
            }
        }
    }

    /// One full scan. Returns the number of resources flipped to completed.
    pub async fn run_once(&self, today: NaiveDate) -> Result<usize> {
        let resources = self.fhir.search_all("MedicationRequest", &[]).await?;
        let mut completed = 0usize;

        for resource in &resources {
            if resource.get("status").and_then(Value::as_str) == Some("completed") {
                continue;
            }

            let Some(authored_on) = authored_date(resource) else {
                tracing::warn!(
                    id = resource.get("id").and_then(serde_json::Value::as_str).unwrap_or("?"),
                    "MedicationRequest without a parseable authoredOn, skipping"
                );
                continue;
            };

            let duration_days = duration_days(resource);
            if !is_over(authored_on, duration_days, today) {
                continue;
            }

            let id = match resource.get("id").and_then(Value::as_str) {
                Some(id) => id,
                None => continue,
            };

            let payload = completion_payload(resource);
            match self.fhir.update("MedicationRequest", id, &payload).await {
                Ok(_) => {
                    completed += 1;
                    metrics::AUTO_COMPLETE_TOTAL
                        .with_label_values(&["completed"])
                        .inc();
                    tracing::info!(id, "MedicationRequest marked as completed");
                }
                Err(e) => {
                    // Keep scanning; this resource is re-evaluated tomorrow.
                    metrics::AUTO_COMPLETE_TOTAL
                        .with_label_values(&["update_failed"])
                        .inc();
                    tracing::error!(id, error = %e, "Failed to complete MedicationRequest");
                }
            }
        }

        Ok(completed)
    }
}

/// The prescription has fully run its course strictly before `today`.
pub fn is_over(authored_on: NaiveDate, duration_days: i64, today: NaiveDate) -> bool {
    let last_day = authored_on + ChronoDuration::days(duration_days - 1);
    today > last_day
}

fn authored_date(resource: &Value) -> Option<NaiveDate> {
    let raw = resource.get("authoredOn")?.as_str()?;
    if let Some(parsed) = timestamp::parse(raw) {
        return Some(parsed.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Planned duration from `boundsDuration`; prescriptions without one count
/// as a single day.
fn duration_days(resource: &Value) -> i64 {
    resource
        .pointer("/dosageInstruction/0/timing/repeat/boundsDuration/value")
        .and_then(Value::as_i64)
        .unwrap_or(1)
}

/// Minimal FHIR-valid update payload carrying the completed status.
fn completion_payload(resource: &Value) -> Value {
    json!({
        "resourceType": "MedicationRequest",
        "id": resource.get("id"),
        "identifier": resource.get("identifier").cloned().unwrap_or_else(|| json!([])),
        "status": "completed",
        "intent": resource.get("intent").and_then(Value::as_str).unwrap_or("order"),
        "subject": resource.get("subject"),
        "medicationCodeableConcept": resource.get("medicationCodeableConcept"),
        "dosageInstruction": resource.get("dosageInstruction").cloned().unwrap_or_else(|| json!([])),
        "note": resource.get("note").cloned().unwrap_or_else(|| json!([]))
    })
}

/// Time until the next occurrence of `hour:minute` UTC.
pub fn next_run_delay(now: chrono::DateTime<Utc>, hour: u32, minute: u32) -> std::time::Duration {
    let today_run = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), hour, minute, 0)
        .single()
        .expect("valid wall-clock time");

    let next = if today_run > now {
        today_run
    } else {
        today_run + ChronoDuration::days(1)
    };

    (next - now).to_std().unwrap_or_default()
}
