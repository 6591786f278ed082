use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::PaymentMethod;
use crate::security::captcha::{self, CaptchaReply, Challenge};
use crate::services::booking::{self, NewBooking};
use crate::services::payment;
use crate::services::trust;
use crate::state::AppState;

use super::bookings::{parse_booking_date, BookingResponse};
use super::payments::PaymentStateResponse;

// GET /api/guest/captcha
pub async fn get_captcha(State(state): State<Arc<AppState>>) -> Json<Challenge> {
    Json(captcha::issue(&state.config.captcha_secret))
}

// POST /api/guest/bookings
#[derive(Deserialize)]
pub struct GuestBookingRequest {
    pub establishment_id: String,
    pub service_id: String,
    pub booking_date: String,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub notes: Option<String>,
    pub payment_method: String,
    pub captcha: CaptchaReply,
}

#[derive(Serialize)]
pub struct GuestBookingResponse {
    pub booking: BookingResponse,
    pub payment: PaymentStateResponse,
}

pub async fn create_guest_booking(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<GuestBookingRequest>,
) -> Result<Json<GuestBookingResponse>, Response> {
    let method = PaymentMethod::try_parse(&body.payment_method).ok_or_else(|| {
        AppError::Validation(format!("unknown payment method: {}", body.payment_method))
            .into_response()
    })?;
    let booking_date = parse_booking_date(&body.booking_date).map_err(IntoResponse::into_response)?;

    // Threat screen, rate limit, captcha — in that order. A wrong captcha
    // answer comes back with a freshly generated challenge and nothing else.
    {
        let mut fields: Vec<(&str, &mut String)> = vec![("guest_name", &mut body.guest_name)];
        if let Some(email) = body.guest_email.as_mut() {
            fields.push(("guest_email", email));
        }
        if let Some(notes) = body.notes.as_mut() {
            fields.push(("notes", notes));
        }

        trust::vet_guest_booking(&state, &mut fields, &body.captcha).map_err(|e| match e {
            AppError::CaptchaFailed => {
                let challenge = captcha::issue(&state.config.captcha_secret);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({
                        "error": "captcha verification failed",
                        "challenge": challenge,
                    })),
                )
                    .into_response()
            }
            other => other.into_response(),
        })?;
    }

    let booking = booking::create_guest_booking(
        &state,
        body.guest_name,
        body.guest_phone,
        body.guest_email,
        NewBooking {
            establishment_id: body.establishment_id,
            service_id: body.service_id,
            booking_date,
            notes: body.notes,
        },
    )
    .map_err(IntoResponse::into_response)?;

    let payment_state = payment::initiate(&state, &booking.id, method)
        .await
        .map_err(IntoResponse::into_response)?;

    // The payment flow may have confirmed the booking (cash, approved card);
    // re-read so the response reflects what actually happened.
    let booking = booking::get(&state, &booking.id).map_err(IntoResponse::into_response)?;

    Ok(Json(GuestBookingResponse {
        booking: booking.into(),
        payment: payment_state.into(),
    }))
}

// GET /api/guest/bookings/:id
//
// Guest bookings have no account behind them; holding the id is holding the
// booking. Client bookings are invisible through this path.
pub async fn get_guest_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let found = booking::get(&state, &id)?;
    if !found.is_guest() {
        return Err(AppError::NotFound(format!("booking {id}")));
    }
    Ok(Json(found.into()))
}
