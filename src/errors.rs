use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("persistence error: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Auth,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("too many attempts, please try again shortly")]
    RateLimited,

    #[error("captcha verification failed")]
    CaptchaFailed,

    #[error("account temporarily locked, try again in {retry_after_secs}s")]
    LockedOut { retry_after_secs: i64 },

    #[error("payment error: {0}")]
    Payment(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::CaptchaFailed => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LockedOut { .. } => StatusCode::LOCKED,
            AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
