//! Inbound data model of the hospital care-plan API.
//!
//! These are the shapes the mobile and ward applications send us. They are
//! validated at the API boundary (`validator` derives) and then handed to the
//! mappers in this crate, which turn them into FHIR R4 resources.
//!
//! Timestamps arrive both with and without a UTC offset depending on the
//! client, so datetime fields use the tolerant codec in [`timestamp`] and are
//! always re-serialized without an offset (the form the upstream FHIR content
//! has always used).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tolerant serde codec for `NaiveDateTime`.
///
/// Accepts `2025-10-03T08:00:00`, `2025-10-03T08:00:00.123`, and
/// RFC 3339 forms with `Z`/offset (normalized to UTC and the offset dropped).
/// Serializes as `%Y-%m-%dT%H:%M:%S` with fractional seconds only when
/// present.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        NaiveDateTime::parse_from_str(s, FORMAT).ok()
    }

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {s}")))
    }
}

/// Optional-field variant of [`timestamp`].
pub mod timestamp_opt {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => super::timestamp::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) => super::timestamp::parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {s}"))),
        }
    }
}

// ------------------ Login ------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PatientLogin {
    #[validate(length(min = 1))]
    pub uhid: String,
}

// ------------------ Surgery ------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SurgeryDetails {
    #[validate(length(min = 1))]
    pub surgery_id: String,
    /// E.g. "Arthritis", "Total Knee Replacement".
    #[validate(length(min = 1))]
    pub surgery_type: String,
    pub video_link: Option<String>,
    pub content_link: Option<String>,
}

// ------------------ Consent form ------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicDetails {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub hospital_registration_number: String,
    pub responsible_attender_name: Option<String>,
    /// Interpreter, guardian, etc.
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeryDetailsSection {
    pub indication: String,
    pub extra_procedures: Option<String>,
    pub site_and_side: Option<String>,
    pub alternatives_considered: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskItem {
    pub risk_name: String,
    pub description: String,
    /// Expected / Common / Uncommon / Rare.
    pub likelihood: String,
    pub factors_increasing_risk: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSpecificRisks {
    pub patient_specific_risks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSpecificConcerns {
    pub blood_transfusion: Option<String>,
    pub other_procedures: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProfessionalStatement {
    pub name: String,
    pub date: NaiveDate,
    pub job_title: String,
    pub signature: Option<String>,
    pub patient_information_leaflet_provided: Option<bool>,
    pub patient_information_leaflet_provided_details: Option<String>,
    pub copy_accepted_by_patient: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientStatement {
    pub interpreter_or_witness_name: Option<String>,
    pub interpreter_or_witness_signature: Option<String>,
    pub information_interpreted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalConsent {
    pub allows_education_research_use: bool,
    pub allows_research_access_to_records: bool,
    pub pregnant_risk_confirmed: Option<bool>,
    pub additional_name: String,
    pub additional_date: String,
    pub caretaker_name: Option<String>,
    pub relationship_to_patient: Option<String>,
    pub reason_for_surrogate_consent: Option<String>,
}

/// The structured consent form content, section by section.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConsentFormData {
    pub basic_details: BasicDetails,
    pub surgery_details: SurgeryDetailsSection,
    #[serde(default)]
    pub risks: Vec<RiskItem>,
    pub patient_specific_risks: Option<PatientSpecificRisks>,
    pub patient_specific_concerns: Option<PatientSpecificConcerns>,
    pub health_professional_statement: Option<HealthProfessionalStatement>,
    pub patient_statement: Option<PatientStatement>,
    pub additional_consent: Option<AdditionalConsent>,
}

/// Lifecycle record of a consent form, separate from its content.
///
/// Numeric codes come from the ward application: `status` 0=draft 1=active
/// 2=rejected; `validation`/`approval` 1=permit, anything else deny. Codes
/// outside the known range are tolerated and mapped to a safe default.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConsentFormStatus {
    pub status: i32,
    #[serde(with = "timestamp")]
    pub status_timestamp: NaiveDateTime,
    pub approval: i32,
    #[serde(with = "timestamp")]
    pub approval_timestamp: NaiveDateTime,
    pub validation: i32,
    #[serde(with = "timestamp")]
    pub validation_timestamp: NaiveDateTime,
    pub document_url: Option<String>,
    #[serde(with = "timestamp")]
    pub document_creation: NaiveDateTime,
}

// ------------------ Pre-op checklist ------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DocumentEntry {
    #[validate(length(min = 1))]
    pub document_name: String,
    pub document_link: String,
    pub assigned_by: String,
    #[serde(with = "timestamp")]
    pub assigned_timestamp: NaiveDateTime,
    pub validated_by: Option<String>,
    #[serde(default, with = "timestamp_opt")]
    pub validation_timestamp: Option<NaiveDateTime>,
    pub updated_by: String,
    #[serde(with = "timestamp")]
    pub updated_timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PreOpChecklist {
    #[serde(default)]
    #[validate(nested)]
    pub documents: Vec<DocumentEntry>,
}

// ------------------ Slot booking ------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SlotBooking {
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(with = "timestamp")]
    pub booking_timestamp: NaiveDateTime,
}

// ------------------ Billing ------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BillingInfo {
    #[validate(length(min = 1))]
    pub invoice_number: String,
}

// ------------------ Watch data ------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchDataEntry {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub sleep_time: Option<f64>,
    pub heart_rate: Option<i64>,
    pub step_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct WatchData {
    #[serde(default)]
    pub yearly: Vec<WatchDataEntry>,
    #[serde(default)]
    pub monthly: Vec<WatchDataEntry>,
    #[serde(default)]
    pub weekly: Vec<WatchDataEntry>,
    #[serde(default)]
    pub daily: Vec<WatchDataEntry>,
    pub step_count_reminder: Option<String>,
}

// ------------------ Tablet prescription ------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DosePeriod {
    Morning,
    Afternoon,
    Night,
}

impl DosePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DosePeriod::Morning => "morning",
            DosePeriod::Afternoon => "afternoon",
            DosePeriod::Night => "night",
        }
    }
}

/// A single tick on the dose calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseEntry {
    pub day: NaiveDate,
    pub period: DosePeriod,
    #[serde(default, with = "timestamp_opt")]
    pub taken_timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TabletPrescriptionEntry {
    #[validate(length(min = 1))]
    pub tablet_name: String,
    pub dosage: String,
    pub before_food: bool,
    pub prescribed_date: NaiveDate,
    #[validate(range(min = 1))]
    pub duration_days: i64,
    /// E.g. "1-0-1".
    pub schedule_pattern: String,
    #[serde(default)]
    pub doses_taken: Vec<DoseEntry>,
    /// 0 = active, 1 = finished.
    #[serde(default)]
    pub completed: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TabletPrescribed {
    #[serde(default)]
    #[validate(nested)]
    pub tablets: Vec<TabletPrescriptionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateDoseRequest {
    #[validate(length(min = 1))]
    pub tablet_name: String,
    pub dose_day: NaiveDate,
    pub dose_period: DosePeriod,
    #[serde(default, with = "timestamp_opt")]
    pub taken_timestamp: Option<NaiveDateTime>,
}

// ------------------ Rehab ------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExerciseEntry {
    #[validate(length(min = 1))]
    pub name: String,
    pub reps: i64,
    pub sets: i64,
    pub difficulty: String,
    pub progress_percentage: f64,
    pub assigned_date: NaiveDate,
    pub assigned_time: NaiveTime,
    #[validate(range(min = 1))]
    pub duration_days: i64,
    pub schedule: String,
    pub period: DosePeriod,
    pub exercise_video: Option<String>,
    #[serde(default, with = "timestamp_opt")]
    pub completed_timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RehabInstructions {
    #[validate(length(min = 1))]
    pub instruction_text: String,
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
}

// ------------------ Meals ------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealPeriod {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealPeriod::Breakfast => "breakfast",
            MealPeriod::Lunch => "lunch",
            MealPeriod::Dinner => "dinner",
            MealPeriod::Snack => "snack",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MealEntry {
    #[validate(length(min = 1))]
    pub meal_name: String,
    pub description: String,
    pub period: MealPeriod,
    pub assigned_date: NaiveDate,
    pub assigned_time: NaiveTime,
    #[serde(default, with = "timestamp_opt")]
    pub completed_timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TodaysMeal {
    #[serde(default)]
    #[validate(nested)]
    pub meals: Vec<MealEntry>,
}
