use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::state::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// GET /health/db
pub async fn store_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.ping()?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "message": "Successfully connected to the store.",
    })))
}
