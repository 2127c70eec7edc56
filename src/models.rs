use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub customer_number: String,
    pub name: String,
    pub age: Option<i32>,
    pub prefecture: Option<String>,
    pub occupation: Option<String>,
    pub experience: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub status: String,
}

/// One timestamped snapshot of a customer's scored evaluation. `values` is
/// the flat item-key mapping straight from import; raw entries are small
/// integers for score items and duration strings for time items. Stored
/// totals are optional upstream aggregates that take precedence over
/// summation when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCheck {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub values: serde_json::Map<String, Value>,
    pub care_score: Option<f64>,
    pub color_score: Option<f64>,
    pub gradation_score: Option<f64>,
    pub time_score: Option<f64>,
    pub total_score: Option<f64>,
    pub total_time: Option<String>,
    pub rank: Option<String>,
}
