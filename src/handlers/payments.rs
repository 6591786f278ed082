use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use crate::errors::AppError;
use crate::models::{Booking, PaymentMethod};
use crate::services::payment::{self, PaymentState};
use crate::services::booking;
use crate::state::AppState;

use super::bookings::current_client;

#[derive(Serialize)]
pub struct PixResponse {
    pub code: String,
    pub expires_at: String,
}

#[derive(Serialize)]
pub struct PaymentStateResponse {
    pub payment_id: String,
    pub booking_id: String,
    pub amount_cents: i64,
    pub method: String,
    pub status: String,
    pub auth_code: Option<String>,
    pub booking_status: String,
    pub pix: Option<PixResponse>,
}

impl From<PaymentState> for PaymentStateResponse {
    fn from(s: PaymentState) -> Self {
        PaymentStateResponse {
            payment_id: s.payment.id,
            booking_id: s.payment.booking_id,
            amount_cents: s.payment.amount_cents,
            method: s.payment.method.as_str().to_string(),
            status: s.payment.status.as_str().to_string(),
            auth_code: s.payment.auth_code,
            booking_status: s.booking_status.as_str().to_string(),
            pix: s.pix.map(|p| PixResponse {
                code: p.code,
                expires_at: p.expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            }),
        }
    }
}

/// Client bookings require the owning client's token; guest bookings are
/// operated on by possession of the booking id alone.
async fn check_booking_access(
    state: &Arc<AppState>,
    headers: &HeaderMap,
    booking: &Booking,
) -> Result<(), AppError> {
    match booking.client_id() {
        Some(owner) => {
            let client = current_client(state, headers).await?;
            if client.client_id != owner {
                return Err(AppError::NotFound(format!("booking {}", booking.id)));
            }
            Ok(())
        }
        None => Ok(()),
    }
}

// POST /api/payments/initiate
#[derive(Deserialize)]
pub struct InitiatePaymentRequest {
    pub booking_id: String,
    pub method: String,
}

pub async fn initiate_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<InitiatePaymentRequest>,
) -> Result<Json<PaymentStateResponse>, AppError> {
    let method = PaymentMethod::try_parse(&body.method)
        .ok_or_else(|| AppError::Validation(format!("unknown payment method: {}", body.method)))?;

    let target = booking::get(&state, &body.booking_id)?;
    check_booking_access(&state, &headers, &target).await?;

    let payment_state = payment::initiate(&state, &body.booking_id, method).await?;
    Ok(Json(payment_state.into()))
}

// GET /api/payments/:booking_id
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<PaymentStateResponse>, AppError> {
    let target = booking::get(&state, &booking_id)?;
    check_booking_access(&state, &headers, &target).await?;

    let payment_state = payment::state_for(&state, &booking_id)?;
    Ok(Json(payment_state.into()))
}

// POST /api/payments/pix/confirm
//
// Callback from the external PIX settlement collaborator. The raw body is
// signed with HMAC-SHA1 under the shared webhook secret; an empty secret
// disables validation for local development.
#[derive(Deserialize)]
pub struct PixConfirmRequest {
    pub booking_id: String,
}

fn validate_webhook_signature(secret: &str, signature: &str, body: &str) -> bool {
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body.as_bytes());
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    expected == signature
}

pub async fn confirm_pix(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<PaymentStateResponse>, AppError> {
    if !state.config.pix_webhook_secret.is_empty() {
        let signature = headers
            .get("x-pix-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty()
            || !validate_webhook_signature(&state.config.pix_webhook_secret, signature, &body)
        {
            tracing::warn!("invalid pix webhook signature");
            return Err(AppError::Auth);
        }
    }

    let request: PixConfirmRequest = serde_json::from_str(&body)
        .map_err(|e| AppError::Validation(format!("invalid confirmation payload: {e}")))?;

    let payment_state = payment::confirm_pix(&state, &request.booking_id)?;
    Ok(Json(payment_state.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_signature_round_trip() {
        let body = r#"{"booking_id":"abc"}"#;
        let mut mac = Hmac::<Sha1>::new_from_slice(b"secret").unwrap();
        mac.update(body.as_bytes());
        let sig = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        assert!(validate_webhook_signature("secret", &sig, body));
        assert!(!validate_webhook_signature("other", &sig, body));
        assert!(!validate_webhook_signature("secret", &sig, r#"{"booking_id":"xyz"}"#));
    }
}
