use crate::server::router::CurationState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde_json::{Value, json};
use tracing::warn;

pub fn router() -> Router<CurationState> {
    Router::new().route("/management/health", get(health))
}

/// `UP` when the store answers a trivial statement.
async fn health(State(state): State<CurationState>) -> (StatusCode, Json<Value>) {
    match state.service.health().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "UP" }))),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "DOWN" })),
            )
        }
    }
}
