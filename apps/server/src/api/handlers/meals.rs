//! Meal plan endpoints.

use super::{post_entries_individually, require_uhid, UhidQuery};
use crate::{fhir, state::AppState, Result};
use axum::{
    extract::{Query, State},
    Json,
};
use pons_mapping::{map, models::TodaysMeal};
use serde_json::{json, Value};
use validator::Validate;

/// Post the daily meal plan as NutritionOrder resources.
pub async fn post_meals(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
    Json(meals): Json<TodaysMeal>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;
    meals.validate()?;

    let bundle = map::meals_bundle(&query.uhid, &meals);
    let count = meals.meals.len();
    Ok(post_entries_individually(
        &state,
        "NutritionOrder",
        &bundle,
        format!("{count} meal(s) posted successfully."),
    )
    .await)
}

/// All NutritionOrder resources for a patient, reshaped into meal entries.
pub async fn get_meals(
    State(state): State<AppState>,
    Query(query): Query<UhidQuery>,
) -> Result<Json<Value>> {
    require_uhid(&query.uhid)?;

    let subject = fhir::subject_query(&query.uhid);
    match state
        .fhir
        .search("NutritionOrder", &[("subject", subject.as_str()), ("_count", "1000")])
        .await
    {
        Ok(data) => {
            let meals: Vec<Value> = fhir::entry_resources(&data)
                .iter()
                .filter(|resource| {
                    resource.get("resourceType").and_then(Value::as_str) == Some("NutritionOrder")
                        && has_uhid_identifier(resource, &query.uhid)
                })
                .map(|resource| {
                    json!({
                        "id": resource.get("id"),
                        "period": resource.pointer("/oralDiet/type/0/text"),
                        "description": resource.pointer("/oralDiet/instruction"),
                        "dateTime": resource.get("dateTime")
                    })
                })
                .collect();

            Ok(Json(json!({"success": true, "meals": meals})))
        }
        Err(e) => Ok(Json(json!({
            "success": false,
            "meals": [],
            "error": e.to_string()
        }))),
    }
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
