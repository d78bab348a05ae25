use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::BookingError;

/// Pre-insert check for the one-appointment-per-slot invariant.
/// Cancelled appointments release their slot, so they are excluded.
pub struct ConflictService {
    supabase: SupabaseClient,
}

impl ConflictService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn slot_taken(
        &self,
        therapist_id: &str,
        date: NaiveDate,
        time: &str,
        auth_token: &str,
    ) -> Result<bool, BookingError> {
        debug!(
            "Checking slot availability for therapist {} on {} at {}",
            therapist_id, date, time
        );

        let path = format!(
            "/rest/v1/appointments?therapist_id=eq.{}&appointment_date=eq.{}&time=eq.{}&status=neq.cancelled&select=id",
            therapist_id, date, time
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(!rows.is_empty())
    }
}
