use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Booking, BookingParty, BookingStatus};
use crate::services::booking::{self, NewBooking};
use crate::services::identity::ClientIdentity;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub establishment_id: String,
    pub service_id: String,
    pub kind: String,
    pub client_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
    pub booking_date: String,
    pub duration_minutes: i32,
    pub total_amount_cents: i64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        let (kind, client_id, guest_name, guest_phone, guest_email) = match b.party {
            BookingParty::Client { client_id } => {
                ("client".to_string(), Some(client_id), None, None, None)
            }
            BookingParty::Guest { name, phone, email } => {
                ("guest".to_string(), None, Some(name), Some(phone), email)
            }
        };

        BookingResponse {
            id: b.id,
            establishment_id: b.establishment_id,
            service_id: b.service_id,
            kind,
            client_id,
            guest_name,
            guest_phone,
            guest_email,
            booking_date: b.booking_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            duration_minutes: b.duration_minutes,
            total_amount_cents: b.total_amount_cents,
            status: b.status.as_str().to_string(),
            notes: b.notes,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub(crate) fn parse_booking_date(s: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| AppError::Validation(format!("invalid booking_date: {s}")))
}

pub(crate) async fn current_client(
    state: &Arc<AppState>,
    headers: &HeaderMap,
) -> Result<ClientIdentity, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() {
        return Err(AppError::Auth);
    }

    let identity = state
        .identity
        .verify_token(token)
        .await
        .map_err(|e| AppError::Persistence(e.context("identity provider failure")))?;

    identity.ok_or(AppError::Auth)
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub establishment_id: String,
    pub service_id: String,
    pub booking_date: String,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let client = current_client(&state, &headers).await?;
    let booking_date = parse_booking_date(&body.booking_date)?;

    let booking = booking::create_client_booking(
        &state,
        &client,
        NewBooking {
            establishment_id: body.establishment_id,
            service_id: body.service_id,
            booking_date,
            notes: body.notes,
        },
    )?;

    Ok(Json(booking.into()))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let client = current_client(&state, &headers).await?;
    let bookings = booking::list_for_client(&state, &client.client_id)?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let client = current_client(&state, &headers).await?;

    let booking = booking::get(&state, &id)?;
    if booking.client_id() != Some(client.client_id.as_str()) {
        // Don't reveal other clients' booking ids.
        return Err(AppError::NotFound(format!("booking {id}")));
    }

    let updated = booking::update_status(&state, &id, BookingStatus::Cancelled)?;
    Ok(Json(updated.into()))
}
