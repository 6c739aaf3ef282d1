pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Json, Router,
};
use pollcast_core::AppState;
use serde_json::{json, Value};

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/polls",
            get(routes::polls::list_polls).post(routes::polls::create_poll),
        )
        .route("/api/polls/{id}", get(routes::polls::get_poll))
        .route(
            "/api/polls/{id}/check-vote/{user_id}",
            get(routes::polls::check_vote),
        )
        .route("/api/polls/{id}/vote", post(routes::polls::vote))
}

/// Liveness only; storage is not consulted.
async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
