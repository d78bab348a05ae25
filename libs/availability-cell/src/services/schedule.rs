use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityRule, CreateRuleRequest, ScheduleError};
use crate::services::calendar;

/// Read/write access to a therapist's availability rules.
pub struct ScheduleService {
    supabase: SupabaseClient,
}

fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_rules(
        &self,
        therapist_id: &str,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityRule>, ScheduleError> {
        debug!("Fetching availability rules for therapist: {}", therapist_id);

        let path = format!(
            "/rest/v1/availability_rules?therapist_id=eq.{}&order=day_of_week.asc,start_time.asc",
            therapist_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| ScheduleError::Database(e.to_string()))
            })
            .collect()
    }

    pub async fn create_rule(
        &self,
        therapist_id: &str,
        request: CreateRuleRequest,
        auth_token: &str,
    ) -> Result<AvailabilityRule, ScheduleError> {
        debug!("Creating availability rule for therapist: {}", therapist_id);

        if calendar::weekday_from_name(&request.day_of_week).is_none() {
            return Err(ScheduleError::Validation(format!(
                "day_of_week must be a weekday name, got {:?}",
                request.day_of_week
            )));
        }

        if let (Some(start), Some(end)) =
            (request.start_time.as_deref(), request.end_time.as_deref())
        {
            let start = calendar::parse_hhmm(start)
                .ok_or_else(|| ScheduleError::Validation("start_time must be HH:MM".to_string()))?;
            let end = calendar::parse_hhmm(end)
                .ok_or_else(|| ScheduleError::Validation("end_time must be HH:MM".to_string()))?;
            if start >= end {
                return Err(ScheduleError::Validation(
                    "Start time must be before end time".to_string(),
                ));
            }
        }

        // Reject overrides that would always be skipped at read time.
        if let Some(special) = request.special_date {
            if calendar::day_name(special) != request.day_of_week {
                return Err(ScheduleError::Validation(format!(
                    "Special date {} does not fall on a {}",
                    special, request.day_of_week
                )));
            }
        }

        let rule_data = json!({
            "therapist_id": therapist_id,
            "day_of_week": request.day_of_week,
            "start_time": request.start_time,
            "end_time": request.end_time,
            "is_available": request.is_available.unwrap_or(true),
            "special_date": request.special_date,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/availability_rules",
                Some(auth_token),
                Some(rule_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(ScheduleError::Database(
                "Failed to create availability rule".to_string(),
            ));
        }

        let rule: AvailabilityRule = serde_json::from_value(result[0].clone())
            .map_err(|e| ScheduleError::Database(e.to_string()))?;
        debug!("Availability rule created with ID: {}", rule.id);

        Ok(rule)
    }

    pub async fn delete_rule(&self, rule_id: &str, auth_token: &str) -> Result<(), ScheduleError> {
        debug!("Deleting availability rule: {}", rule_id);

        // A bare PostgREST DELETE answers 204 with no body; asking for
        // the representation keeps the response parseable.
        let path = format!("/rest/v1/availability_rules?id=eq.{}", rule_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(representation_headers()),
            )
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        Ok(())
    }
}
