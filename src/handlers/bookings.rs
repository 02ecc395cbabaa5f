use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingInput, ResolvedBooking, StatusInput};
use crate::services::booking;
use crate::state::AppState;

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookingInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(input) = payload?;
    let booking = booking::create_booking(&state.store, input)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BookingsQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let Query(query) = query?;
    let bookings = booking::list_bookings(&state.store, query.status.as_deref())?;
    Ok(Json(bookings))
}

// GET /bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResolvedBooking>, AppError> {
    Ok(Json(booking::get_resolved_booking(&state.store, &id)?))
}

// POST /bookings/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<StatusInput>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let Json(input) = payload?;
    Ok(Json(booking::update_status(&state.store, &id, input)?))
}
