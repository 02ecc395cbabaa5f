use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Service, ServiceInput, Upsert};
use crate::services::catalog;
use crate::state::AppState;

// POST /services
//
// 201 when the service is new, 200 when an existing one had its rate changed.
pub async fn upsert_service(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ServiceInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    let Json(input) = payload?;
    let (service, outcome) = catalog::upsert_service(&state.store, input)?;

    let status = match outcome {
        Upsert::Created => StatusCode::CREATED,
        Upsert::Updated => StatusCode::OK,
    };
    Ok((status, Json(service)))
}

// GET /services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    Ok(Json(catalog::list_services(&state.store)?))
}
