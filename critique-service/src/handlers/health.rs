use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Never calls the provider.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "critique-service",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.provider.model(),
    }))
}
