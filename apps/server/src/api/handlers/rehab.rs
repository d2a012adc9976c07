//! Rehabilitation endpoints: exercises (Task) and instructions
//! (Observation).

use super::{failure_message, require_uhid, success_message, UhidQuery};
use crate::{fhir, state::AppState, Result};
use axum::{
    extract::{Query, State},
    Json,
};
use pons_mapping::{
    map,
    models::{ExerciseEntry, RehabInstructions},
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct DeleteExerciseQuery {
    pub uhid: String,
    pub exercise_name: String,
}

/// Post each exercise as a Task resource.
pub async fn post_exercises(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(exercises): Json<Vec<ExerciseEntry>>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    for exercise in &exercises {
        exercise.validate()?;
    }

    for (index, exercise) in exercises.iter().enumerate() {
        let task = map::exercise_task(&query.uhid, exercise);
        if let Err(e) = state.fhir.create("Task", &task).await {
            return Ok(Json(json!({
                "success": false,
                "message": format!("Error posting Task: {e}"),
                "posted": index
            })));
        }
    }

    Ok(success_message(format!(
        "{} exercise(s) posted successfully.",
        exercises.len()
    )))
}

/// Post each instruction as an Observation resource.
pub async fn post_instructions(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(instructions): Json<Vec<RehabInstructions>>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    for instruction in &instructions {
        instruction.validate()?;
    }

    for (index, instruction) in instructions.iter().enumerate() {
        let observation = map::instruction_observation(&query.uhid, instruction);
        if let Err(e) = state.fhir.create("Observation", &observation).await {
            return Ok(Json(json!({
                "success": false,
                "message": format!("Error posting Observation: {e}"),
                "posted": index
            })));
        }
    }

    Ok(success_message(format!(
        "{} instruction(s) posted successfully.",
        instructions.len()
    )))
}

/// All exercises for a patient.
pub async fn get_exercises(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    match fetch_tasks(&state, &query.uhid).await {
        Ok(tasks) => {
            let exercises: Vec<Value> = tasks.iter().map(exercise_summary).collect();
            Ok(Json(json!({"success": true, "exercises": exercises})))
        }
        Err(e) => Ok(Json(json!({
            "success": false,
            "exercises": [],
            "error": e.to_string()
        }))),
    }
}

/// Exercises still in progress for a patient.
pub async fn get_in_progress_exercises(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    match fetch_tasks(&state, &query.uhid).await {
        Ok(tasks) => {
            let exercises: Vec<Value> = tasks
                .iter()
                .filter(|task| task.get("status").and_then(Value::as_str) == Some("in-progress"))
                .map(exercise_summary)
                .collect();
            Ok(Json(json!({
                "success": true,
                "in_progress_exercises": exercises
            })))
        }
        Err(e) => Ok(Json(json!({
            "success": false,
            "in_progress_exercises": [],
            "error": e.to_string()
        }))),
    }
}

/// Delete in-progress exercises whose description matches the name
/// (case-insensitive substring). Completed exercises are never deleted.
pub async fn delete_exercise(
    State(state): State<AppState>,
    Query(query): Query<DeleteExerciseQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let tasks = match fetch_tasks(&state, &query.uhid).await {
        Ok(tasks) => tasks,
        Err(e) => return Ok(failure_message(format!("Error fetching Tasks: {e}"))),
    };

    let needle = query.exercise_name.to_lowercase();
    let mut deleted = 0usize;

    for task in &tasks {
        let Some(id) = task.get("id").and_then(Value::as_str) else {
            continue;
        };
        let description = task
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("");

        if task.get("status").and_then(Value::as_str) == Some("in-progress")
            && description.to_lowercase().contains(&needle)
        {
            if let Err(e) = state.fhir.delete("Task", id).await {
                return Ok(failure_message(format!("Error deleting Task {id}: {e}")));
            }
            deleted += 1;
        }
    }

    if deleted == 0 {
        return Ok(failure_message(format!(
            "No in-progress exercise named '{}' found for UHID {}.",
            query.exercise_name, query.uhid
        )));
    }

    Ok(success_message(format!(
        "Deleted {deleted} exercise(s) named '{}' for UHID {}.",
        query.exercise_name, query.uhid
    )))
}

/// Rehab instructions only: Observations with the instruction code and the
/// patient's identifier.
pub async fn get_instructions(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let subject = fhir::subject_query(&query.uhid);
    match state
        .fhir
        .search("Observation", &[("_count", "1000"), ("subject", subject.as_str())])
        .await
    {
        Ok(data) => {
            let instructions: Vec<Value> = fhir::entry_resources(&data)
                .iter()
                .filter(|resource| {
                    resource.get("resourceType").and_then(Value::as_str) == Some("Observation")
                        && resource.pointer("/code/text").and_then(Value::as_str)
                            == Some("Rehabilitation Instruction")
                        && has_uhid_identifier(resource, &query.uhid)
                })
                .map(|resource| {
                    json!({
                        "id": resource.get("id"),
                        "instruction_text": resource.get("valueString"),
                        "timestamp": resource.get("effectiveDateTime")
                    })
                })
                .collect();

            Ok(Json(json!({"success": true, "instructions": instructions})))
        }
        Err(e) => Ok(Json(json!({
            "success": false,
            "instructions": [],
            "error": e.to_string()
        }))),
    }
}

async fn fetch_tasks(state: &AppState, uhid: &str) -> Result<Vec<Value>> {
    let subject = fhir::subject_query(uhid);
    let data = state.fhir.search("Task", &[("subject", subject.as_str())]).await?;
    Ok(fhir::entry_resources(&data)
        .into_iter()
        .filter(|resource| resource.get("resourceType").and_then(Value::as_str) == Some("Task"))
        .collect())
}

fn has_uhid_identifier(resource: &Value, uhid: &str) -> bool {
    resource
        .get("identifier")
        .and_then(Value::as_array)
        .map(|identifiers| {
            identifiers
                .iter()
                .any(|identifier| identifier.get("value").and_then(Value::as_str) == Some(uhid))
        })
        .unwrap_or(false)
}

/// Flatten a Task into the exercise summary shape, recovering progress and
/// duration from the notes.
fn exercise_summary(task: &Value) -> Value {
    let mut video_url = Value::Null;
    if let Some(inputs) = task.get("input").and_then(Value::as_array) {
        for input in inputs {
            if let Some(url) = input.get("valueUrl") {
                video_url = url.clone();
            }
        }
    }

    let mut progress_percentage = Value::Null;
    let mut duration_days = Value::Null;
    let mut progress_notes = Vec::new();

    if let Some(notes) = task.get("note").and_then(Value::as_array) {
        for note in notes {
            let Some(text) = note.get("text").and_then(Value::as_str) else {
                continue;
            };
            progress_notes.push(text.to_string());

            if let Some(rest) = text.strip_prefix("Progress:") {
                if let Ok(parsed) = rest.trim().trim_end_matches('%').parse::<f64>() {
                    progress_percentage = json!(parsed);
                }
            } else if let Some(rest) = text.strip_prefix("Duration Days:") {
                if let Ok(parsed) = rest.trim().parse::<i64>() {
                    duration_days = json!(parsed);
                }
            }
        }
    }

    json!({
        "id": task.get("id"),
        "name": task.get("description"),
        "status": task.get("status"),
        "execution_period": task.get("executionPeriod"),
        "progress_percentage": progress_percentage,
        "duration_days": duration_days,
        "exercise_video": video_url,
        "completed_timestamp": task.pointer("/executionPeriod/end"),
        "progress_notes": progress_notes
    })
}
