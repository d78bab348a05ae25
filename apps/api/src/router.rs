use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use availability_cell::router::availability_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Physio Booking API is running!" }))
        .nest("/therapists", availability_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
}
