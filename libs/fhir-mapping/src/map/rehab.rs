//! Rehabilitation mapping: exercises become Tasks, instructions become
//! Observations.

use crate::models::{timestamp, ExerciseEntry, RehabInstructions};
use crate::{meta_profile, patient_reference, uhid_identifier};
use serde_json::{json, Value};

/// FHIR Task for an assigned exercise.
///
/// Progress percentage and planned duration have no Task element; they ride
/// in `note` as `Progress: {n}%` / `Duration Days: {n}` and the read path
/// parses them back out. The execution period closes only once the exercise
/// is completed.
pub fn exercise_task(uhid: &str, exercise: &ExerciseEntry) -> Value {
    let mut task = json!({
        "resourceType": "Task",
        "identifier": [uhid_identifier(uhid)],
        "status": if exercise.completed_timestamp.is_some() { "completed" } else { "in-progress" },
        "intent": "order",
        "description": format!(
            "{} - {} reps x {} sets ({})",
            exercise.name, exercise.reps, exercise.sets, exercise.difficulty
        ),
        "for": patient_reference(uhid),
        "executionPeriod": {
            "start": format!("{}T{}", exercise.assigned_date, exercise.assigned_time)
        },
        "note": [
            {"text": format!("Progress: {}%", exercise.progress_percentage)},
            {"text": format!("Duration Days: {}", exercise.duration_days)}
        ],
        "meta": meta_profile("Task")
    });

    if let Some(completed) = exercise.completed_timestamp {
        task["executionPeriod"]["end"] = json!(completed.format(timestamp::FORMAT).to_string());
    }

    if let Some(video) = &exercise.exercise_video {
        task["input"] = json!([{
            "type": {
                "coding": [{
                    "system": "http://terminology.hl7.org/CodeSystem/task-input-type",
                    "code": "attachment",
                    "display": "Exercise Video"
                }],
                "text": "Exercise Video URL"
            },
            "valueUrl": video
        }]);
    }

    task
}

/// FHIR Observation for a free-text rehab instruction.
pub fn instruction_observation(uhid: &str, instruction: &RehabInstructions) -> Value {
    json!({
        "resourceType": "Observation",
        "identifier": [uhid_identifier(uhid)],
        "status": "final",
        "code": {"text": "Rehabilitation Instruction"},
        "subject": patient_reference(uhid),
        "valueString": instruction.instruction_text,
        "effectiveDateTime": instruction.timestamp.format(timestamp::FORMAT).to_string(),
        "meta": meta_profile("Observation")
    })
}
