use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub secret: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

// POST /api/auth/login
//
// Credentials are checked by the external identity provider; this handler
// owns only the brute-force lockout around it.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let identifier = body.identifier.trim().to_string();
    if identifier.is_empty() || body.secret.is_empty() {
        return Err(AppError::Validation(
            "identifier and secret are required".to_string(),
        ));
    }

    if let Err(until) = state.lockouts.check(&identifier) {
        return Err(AppError::LockedOut {
            retry_after_secs: (until - Utc::now().timestamp()).max(0),
        });
    }

    let token = state
        .identity
        .authenticate(&identifier, &body.secret)
        .await
        .map_err(|e| AppError::Persistence(e.context("identity provider failure")))?;

    match token {
        Some(token) => {
            state.lockouts.record_success(&identifier);
            Ok(Json(LoginResponse { token }))
        }
        None => {
            tracing::warn!(identifier = %identifier, "failed login attempt");
            if let Some(until) = state.lockouts.record_failure(&identifier) {
                return Err(AppError::LockedOut {
                    retry_after_secs: (until - Utc::now().timestamp()).max(0),
                });
            }
            Err(AppError::Auth)
        }
    }
}
