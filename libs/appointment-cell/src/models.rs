use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

/// Lifecycle of a booked appointment. Stored lowercase in the
/// `appointments` table; `cancelled` rows no longer hold their slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Ongoing,
    Cancelled,
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Ongoing => write!(f, "ongoing"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub therapist_id: Uuid,
    pub staff_id: Uuid,
    pub appointment_date: NaiveDate,
    /// Slot start in "HH:MM", matching the materialized week view.
    pub time: String,
    pub consultation_type: Option<String>,
    pub status: AppointmentStatus,
    pub plan_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking payload. Date and time are optional at the wire level so the
/// service can report exactly which field is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub therapist_id: Uuid,
    pub appointment_date: Option<NaiveDate>,
    pub time: Option<String>,
    pub consultation_type: Option<String>,
}

/// Who is making the request, resolved from the authenticated user id.
/// The same user id never maps to more than one variant; resolution
/// stops at the first matching profile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerIdentity {
    Patient(Uuid),
    Therapist(Uuid),
    Staff(Uuid),
    Business(Uuid),
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("time must be HH:MM")]
    InvalidTime,
    #[error("No patient profile found for this account")]
    NoPatientProfile,
    #[error("Therapist not found")]
    TherapistNotFound,
    #[error("Business not found for therapist")]
    BusinessNotFound,
    #[error("No staff available to assign")]
    StaffNotFound,
    #[error("Account has no patient, therapist, staff or business profile")]
    UnresolvedIdentity,
    #[error("This time slot is already booked")]
    SlotTaken,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::MissingField(_) | BookingError::InvalidTime => {
                AppError::ValidationError(err.to_string())
            }
            BookingError::NoPatientProfile
            | BookingError::TherapistNotFound
            | BookingError::BusinessNotFound
            | BookingError::StaffNotFound => AppError::NotFound(err.to_string()),
            BookingError::UnresolvedIdentity => AppError::Auth(err.to_string()),
            BookingError::SlotTaken => AppError::Conflict(err.to_string()),
            BookingError::DatabaseError(detail) => AppError::Database(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(AppointmentStatus::Pending).unwrap(),
            serde_json::json!("pending")
        );
        assert_eq!(AppointmentStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn missing_field_maps_to_validation_error() {
        let err: AppError = BookingError::MissingField("appointment_date").into();
        assert_matches!(err, AppError::ValidationError(msg) if msg.contains("appointment_date"));
    }

    #[test]
    fn slot_taken_maps_to_conflict() {
        let err: AppError = BookingError::SlotTaken.into();
        assert_matches!(err, AppError::Conflict(_));
    }

    #[test]
    fn unresolved_identity_maps_to_auth() {
        let err: AppError = BookingError::UnresolvedIdentity.into();
        assert_matches!(err, AppError::Auth(_));
    }
}
