//! Wearable metric mapping.
//!
//! Each watch entry fans out into up to three Observations (heart rate,
//! step count, sleep duration); a metric the watch did not report is simply
//! not emitted. The time bucket (yearly/monthly/weekly/daily) becomes the
//! Observation category.

use crate::models::{timestamp, WatchData, WatchDataEntry};
use crate::{meta_profile, patient_reference, post_entry, transaction_bundle, uhid_identifier};
use serde_json::{json, Number, Value};

const CATEGORY_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/observation-category";

fn observation(uhid: &str, bucket: &str, entry: &WatchDataEntry, code: &str, value: Number, unit: &str) -> Value {
    json!({
        "resourceType": "Observation",
        "identifier": [uhid_identifier(uhid)],
        "status": "final",
        "category": [{
            "coding": [{"system": CATEGORY_SYSTEM, "code": bucket}],
            "text": bucket
        }],
        "code": {"text": code},
        "subject": patient_reference(uhid),
        "effectiveDateTime": entry.timestamp.format(timestamp::FORMAT).to_string(),
        "valueQuantity": {"value": value, "unit": unit},
        "meta": meta_profile("Observation")
    })
}

/// All watch metrics as a transaction Bundle of Observations.
pub fn watch_bundle(uhid: &str, watch: &WatchData) -> Value {
    let buckets: [(&str, &[WatchDataEntry]); 4] = [
        ("yearly", &watch.yearly),
        ("monthly", &watch.monthly),
        ("weekly", &watch.weekly),
        ("daily", &watch.daily),
    ];

    let mut entries = Vec::new();
    for (bucket, items) in buckets {
        for item in items {
            if let Some(rate) = item.heart_rate {
                let obs = observation(uhid, bucket, item, "Heart Rate", rate.into(), "beats/minute");
                entries.push(post_entry(obs, "Observation"));
            }
            if let Some(steps) = item.step_count {
                let obs = observation(uhid, bucket, item, "Step Count", steps.into(), "steps");
                entries.push(post_entry(obs, "Observation"));
            }
            if let Some(sleep) = item.sleep_time {
                if let Some(value) = Number::from_f64(sleep) {
                    let obs = observation(uhid, bucket, item, "Sleep Duration", value, "hours");
                    entries.push(post_entry(obs, "Observation"));
                }
            }
        }
    }

    transaction_bundle(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(sleep: Option<f64>, rate: Option<i64>, steps: Option<i64>) -> WatchDataEntry {
        WatchDataEntry {
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            sleep_time: sleep,
            heart_rate: rate,
            step_count: steps,
        }
    }

    #[test]
    fn all_metrics_present_emits_three_observations() {
        let watch = WatchData {
            yearly: vec![entry(Some(7.5), Some(72), Some(10000))],
            ..Default::default()
        };
        let bundle = watch_bundle("UHID1", &watch);
        let entries = bundle["entry"].as_array().unwrap();
        assert_eq!(entries.len(), 3);

        let codes: Vec<&str> = entries
            .iter()
            .map(|e| e["resource"]["code"]["text"].as_str().unwrap())
            .collect();
        assert_eq!(codes, ["Heart Rate", "Step Count", "Sleep Duration"]);
        assert_eq!(entries[0]["resource"]["category"][0]["text"], "yearly");
        assert_eq!(entries[0]["resource"]["valueQuantity"]["unit"], "beats/minute");
    }

    #[test]
    fn absent_metrics_emit_nothing() {
        let watch = WatchData {
            daily: vec![entry(None, None, None)],
            ..Default::default()
        };
        let bundle = watch_bundle("UHID1", &watch);
        assert!(bundle["entry"].as_array().unwrap().is_empty());
    }

    #[test]
    fn buckets_keep_their_own_category() {
        let watch = WatchData {
            weekly: vec![entry(None, Some(70), None)],
            daily: vec![entry(None, Some(71), None)],
            ..Default::default()
        };
        let bundle = watch_bundle("UHID1", &watch);
        let entries = bundle["entry"].as_array().unwrap();
        assert_eq!(entries[0]["resource"]["category"][0]["coding"][0]["code"], "weekly");
        assert_eq!(entries[1]["resource"]["category"][0]["coding"][0]["code"], "daily");
    }
}
