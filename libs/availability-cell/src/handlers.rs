use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::CreateRuleRequest;
use crate::services::{schedule::ScheduleService, slots::SlotService};

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

/// The bookable-slot view for the next 7 days. Zero non-unavailable
/// entries means "no slots this week", not a fault.
#[axum::debug_handler]
pub async fn get_week_availability(
    State(state): State<Arc<AppConfig>>,
    Path(therapist_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let slot_service = SlotService::new(&state);

    let days = slot_service
        .week_availability(&therapist_id, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "therapist_id": therapist_id,
        "days": days
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_rules(
    State(state): State<Arc<AppConfig>>,
    Path(therapist_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let rules = schedule_service
        .list_rules(&therapist_id, auth.token())
        .await?;

    let total = rules.len();
    Ok(Json(json!({
        "rules": rules,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn create_rule(
    State(state): State<Arc<AppConfig>>,
    Path(therapist_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    let rule = schedule_service
        .create_rule(&therapist_id, request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "rule": rule
    })))
}

#[axum::debug_handler]
pub async fn delete_rule(
    State(state): State<Arc<AppConfig>>,
    Path(rule_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let schedule_service = ScheduleService::new(&state);

    schedule_service
        .delete_rule(&rule_id, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true
    })))
}
