use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Customer, CustomerInput};
use crate::services::customers;
use crate::state::AppState;

// POST /customers
pub async fn register_customer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CustomerInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let Json(input) = payload?;
    let customer = customers::register_customer(&state.store, input)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /customers
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Customer>>, AppError> {
    Ok(Json(customers::list_customers(&state.store)?))
}
