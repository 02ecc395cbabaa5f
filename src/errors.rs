use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("a booking already exists for {date}, please choose another date")]
    ScheduleConflict { date: NaiveDate },

    #[error("service with id {0} not found")]
    ServiceNotFound(String),

    #[error("customer with id {0} not found")]
    CustomerNotFound(String),

    #[error("a customer with email {0} already exists")]
    DuplicateEmail(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ScheduleConflict { .. } => StatusCode::CONFLICT,
            AppError::ServiceNotFound(_) => StatusCode::BAD_REQUEST,
            AppError::CustomerNotFound(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Store(e) => {
                tracing::error!(error = ?e, "store operation failed");
                serde_json::json!({ "message": "Internal Server Error" })
            }
            AppError::ScheduleConflict { date } => serde_json::json!({
                "message": self.to_string(),
                "date": date.format("%Y-%m-%d").to_string(),
            }),
            AppError::ServiceNotFound(id) => serde_json::json!({
                "message": self.to_string(),
                "serviceId": id,
            }),
            _ => serde_json::json!({ "message": self.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}
