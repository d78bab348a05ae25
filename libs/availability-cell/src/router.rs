use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn availability_routes(state: Arc<AppConfig>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new().route(
        "/{therapist_id}/week-availability",
        get(handlers::get_week_availability),
    );

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/{therapist_id}/availability", get(handlers::list_rules))
        .route("/{therapist_id}/availability", post(handlers::create_rule))
        .route("/availability/{rule_id}", delete(handlers::delete_rule))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
