use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{BookingError, CallerIdentity};

/// Resolves the authenticated user to their profile row. A user id maps
/// to at most one role; the probe order is fixed so the result is
/// deterministic even if data drifts.
pub struct IdentityService {
    supabase: SupabaseClient,
}

impl IdentityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn resolve(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<CallerIdentity, BookingError> {
        debug!("Resolving caller identity for user: {}", user_id);

        if let Some(id) = self
            .probe("patients", "user_id", user_id, auth_token)
            .await?
        {
            return Ok(CallerIdentity::Patient(id));
        }
        if let Some(id) = self
            .probe("therapists", "user_id", user_id, auth_token)
            .await?
        {
            return Ok(CallerIdentity::Therapist(id));
        }
        if let Some(id) = self.probe("staff", "user_id", user_id, auth_token).await? {
            return Ok(CallerIdentity::Staff(id));
        }
        if let Some(id) = self
            .probe("businesses", "owner_user_id", user_id, auth_token)
            .await?
        {
            return Ok(CallerIdentity::Business(id));
        }

        Err(BookingError::UnresolvedIdentity)
    }

    async fn probe(
        &self,
        table: &str,
        column: &str,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Option<Uuid>, BookingError> {
        let path = format!(
            "/rest/v1/{}?{}=eq.{}&select=id&limit=1",
            table, column, user_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let id = row
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                BookingError::DatabaseError(format!("Malformed id in {} row", table))
            })?;

        Ok(Some(id))
    }
}
