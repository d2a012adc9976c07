//! Meal plan mapping: one NutritionOrder per meal.

use crate::models::{MealEntry, TodaysMeal};
use crate::{meta_profile, post_entry, transaction_bundle, uhid_identifier};
use serde_json::{json, Value};

pub fn meal_order(uhid: &str, meal: &MealEntry) -> Value {
    json!({
        "resourceType": "NutritionOrder",
        "identifier": [uhid_identifier(uhid)],
        "status": "active",
        "intent": "order",
        "patient": {"reference": format!("Patient/{uhid}")},
        "dateTime": format!("{}T{}", meal.assigned_date, meal.assigned_time),
        "oralDiet": {
            "type": [{"text": meal.period.as_str()}],
            "instruction": meal.description
        },
        "meta": meta_profile("NutritionOrder")
    })
}

pub fn meals_bundle(uhid: &str, meals: &TodaysMeal) -> Value {
    let entries = meals
        .meals
        .iter()
        .map(|meal| post_entry(meal_order(uhid, meal), "NutritionOrder"))
        .collect();
    transaction_bundle(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealPeriod;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn meal_order_shape() {
        let meal = MealEntry {
            meal_name: "Breakfast".into(),
            description: "Oats with fruits and milk".into(),
            period: MealPeriod::Breakfast,
            assigned_date: NaiveDate::from_ymd_opt(2025, 10, 3).unwrap(),
            assigned_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            completed_timestamp: None,
        };
        let order = meal_order("UHID1", &meal);
        assert_eq!(order["resourceType"], "NutritionOrder");
        assert_eq!(order["dateTime"], "2025-10-03T08:00:00");
        assert_eq!(order["oralDiet"]["type"][0]["text"], "breakfast");
        assert_eq!(order["oralDiet"]["instruction"], "Oats with fruits and milk");
        assert_eq!(order["patient"]["reference"], "Patient/UHID1");
    }

    #[test]
    fn empty_plan_is_an_empty_bundle() {
        let bundle = meals_bundle("UHID1", &TodaysMeal::default());
        assert!(bundle["entry"].as_array().unwrap().is_empty());
    }
}
