pub mod bookings;
pub mod catalog;
pub mod customers;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/db", get(health::store_health))
        .route(
            "/customers",
            get(customers::list_customers).post(customers::register_customer),
        )
        .route(
            "/services",
            get(catalog::list_services).post(catalog::upsert_service),
        )
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/status", post(bookings::update_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
