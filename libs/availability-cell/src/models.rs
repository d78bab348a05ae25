use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

/// One row of a therapist's schedule: either a recurring weekly rule
/// (`special_date` is null) or a one-off override for a single date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub therapist_id: Uuid,
    /// English weekday name ("Monday".."Sunday").
    pub day_of_week: String,
    /// "HH:MM" wall-clock strings; the working window is [start, end).
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_available: bool,
    /// When set, the rule applies only to this date and only if the
    /// date's actual weekday matches `day_of_week`.
    pub special_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bookable slots for one calendar date. Derived view, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub morning: Vec<String>,
    pub afternoon: Vec<String>,
    pub unavailable: bool,
}

impl DaySlots {
    pub fn empty(date: NaiveDate, day_of_week: &str) -> Self {
        Self {
            date,
            day_of_week: day_of_week.to_string(),
            morning: Vec::new(),
            afternoon: Vec::new(),
            unavailable: true,
        }
    }
}

/// Distinguishes rejected input from store failures so the HTTP layer
/// can answer 400 for the former and 500 for the latter.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(msg) => AppError::ValidationError(msg),
            ScheduleError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRuleRequest {
    pub day_of_week: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_available: Option<bool>,
    pub special_date: Option<NaiveDate>,
}
