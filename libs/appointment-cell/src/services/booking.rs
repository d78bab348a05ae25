use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{Appointment, BookingError, CallerIdentity, CreateBookingRequest};
use crate::services::{conflict::ConflictService, identity::IdentityService};

/// Creates and lists appointments. The conflict precondition plus the
/// partial unique index on (therapist_id, appointment_date, time) for
/// non-cancelled rows guarantee at most one booking per slot; the
/// insert is the last step, so a failure leaves no partial state.
pub struct BookingService {
    supabase: SupabaseClient,
    identity: IdentityService,
    conflict: ConflictService,
}

fn is_valid_hhmm(time: &str) -> bool {
    let Some((h, m)) = time.split_once(':') else {
        return false;
    };
    if h.len() != 2 || m.len() != 2 {
        return false;
    }
    match (h.parse::<u32>(), m.parse::<u32>()) {
        (Ok(h), Ok(m)) => h < 24 && m < 60,
        _ => false,
    }
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            identity: IdentityService::new(config),
            conflict: ConflictService::new(config),
        }
    }

    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        // Field checks come first so a bad payload never touches the store.
        let appointment_date = request
            .appointment_date
            .ok_or(BookingError::MissingField("appointment_date"))?;
        let time = request.time.ok_or(BookingError::MissingField("time"))?;
        if !is_valid_hhmm(&time) {
            return Err(BookingError::InvalidTime);
        }

        let patient_id = match self.identity.resolve(&user.id, auth_token).await? {
            CallerIdentity::Patient(id) => id,
            _ => return Err(BookingError::NoPatientProfile),
        };

        let business_id = self
            .therapist_business(&request.therapist_id, auth_token)
            .await?;
        let staff_id = self.assign_staff(&business_id, auth_token).await?;

        if self
            .conflict
            .slot_taken(
                &request.therapist_id.to_string(),
                appointment_date,
                &time,
                auth_token,
            )
            .await?
        {
            return Err(BookingError::SlotTaken);
        }

        let appointment_data = json!({
            "patient_id": patient_id,
            "therapist_id": request.therapist_id,
            "staff_id": staff_id,
            "appointment_date": appointment_date,
            "time": time,
            "consultation_type": request.consultation_type,
            "status": "pending",
            "plan_id": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| {
                // The unique index rejects the loser of a concurrent race.
                if e.to_string().starts_with("Conflict") {
                    BookingError::SlotTaken
                } else {
                    BookingError::DatabaseError(e.to_string())
                }
            })?;

        let appointment: Appointment = result
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?
            .ok_or_else(|| {
                BookingError::DatabaseError("Insert returned no appointment row".to_string())
            })?;

        info!(
            "Appointment {} booked for therapist {} on {} at {}",
            appointment.id, appointment.therapist_id, appointment.appointment_date,
            appointment.time
        );

        Ok(appointment)
    }

    /// Appointments visible to the caller, matched on the column of
    /// their resolved role. Business owners hold no appointment column.
    pub async fn appointments_for_identity(
        &self,
        identity: CallerIdentity,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let (column, id) = match identity {
            CallerIdentity::Patient(id) => ("patient_id", id),
            CallerIdentity::Therapist(id) => ("therapist_id", id),
            CallerIdentity::Staff(id) => ("staff_id", id),
            CallerIdentity::Business(_) => return Ok(Vec::new()),
        };

        debug!("Listing appointments where {} = {}", column, id);

        let path = format!(
            "/rest/v1/appointments?{}=eq.{}&order=appointment_date.asc,time.asc",
            column, id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| BookingError::DatabaseError(e.to_string()))
            })
            .collect()
    }

    pub async fn resolve_identity(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<CallerIdentity, BookingError> {
        self.identity.resolve(&user.id, auth_token).await
    }

    async fn therapist_business(
        &self,
        therapist_id: &Uuid,
        auth_token: &str,
    ) -> Result<Uuid, BookingError> {
        let path = format!(
            "/rest/v1/therapists?id=eq.{}&select=id,business_id",
            therapist_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let row = rows.first().ok_or(BookingError::TherapistNotFound)?;
        row.get("business_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(BookingError::BusinessNotFound)
    }

    /// Lowest staff id wins so the assignment is deterministic.
    async fn assign_staff(
        &self,
        business_id: &Uuid,
        auth_token: &str,
    ) -> Result<Uuid, BookingError> {
        let path = format!(
            "/rest/v1/staff?business_id=eq.{}&select=id&order=id.asc&limit=1",
            business_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        rows.first()
            .and_then(|row| row.get("id"))
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(BookingError::StaffNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hhmm_validation_accepts_two_digit_fields_only() {
        assert!(is_valid_hhmm("09:00"));
        assert!(is_valid_hhmm("23:59"));
        assert!(!is_valid_hhmm("9:00"));
        assert!(!is_valid_hhmm("24:00"));
        assert!(!is_valid_hhmm("12:60"));
        assert!(!is_valid_hhmm("noon"));
        assert!(!is_valid_hhmm("12:00:00"));
    }
}
