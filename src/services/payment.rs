use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Payment, PaymentMethod, PaymentStatus};
use crate::services::gateway::CardAuthorization;
use crate::state::AppState;

/// Advisory display window for a PIX code. Nothing here expires the payment
/// when it elapses; the external confirmation collaborator owns that.
pub const PIX_VALIDITY_MINUTES: i64 = 15;

#[derive(Debug, Clone, Serialize)]
pub struct PixInstructions {
    pub code: String,
    pub expires_at: NaiveDateTime,
}

/// What the caller gets back from the orchestrator: the payment record, the
/// booking status it left behind, and PIX display instructions when the flow
/// is waiting on an external confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentState {
    pub payment: Payment,
    pub booking_status: BookingStatus,
    pub pix: Option<PixInstructions>,
}

/// Drives a booking's payment through the flow its method selects.
///
/// Idempotent per booking: there is at most one payment row per booking, a
/// call against a terminal payment returns the existing state unchanged, and
/// a call against a pending PIX payment with the same method re-returns the
/// same code. A failed card attempt may be re-driven, with the same or a
/// different method, on the same row.
pub async fn initiate(
    state: &Arc<AppState>,
    booking_id: &str,
    method: PaymentMethod,
) -> Result<PaymentState, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, booking_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::Validation(
            "cannot take payment for a cancelled booking".to_string(),
        ));
    }

    let existing = {
        let db = state.db.lock().unwrap();
        queries::get_payment_by_booking(&db, booking_id)?
    };

    if let Some(payment) = &existing {
        if payment.status.is_terminal() {
            return Ok(assemble_state(&booking, payment.clone()));
        }
        if payment.status == PaymentStatus::Pending
            && payment.method == method
            && method == PaymentMethod::Pix
        {
            // Same code re-displayed; a fresh one would orphan the first.
            return Ok(assemble_state(&booking, payment.clone()));
        }
    }

    match method {
        PaymentMethod::CreditCard => charge_card(state, &booking, existing).await,
        PaymentMethod::Pix => start_pix(state, &booking, existing),
        PaymentMethod::Cash => defer_to_cash(state, &booking, existing),
    }
}

async fn charge_card(
    state: &Arc<AppState>,
    booking: &Booking,
    existing: Option<Payment>,
) -> Result<PaymentState, AppError> {
    let authorization = state
        .cards
        .authorize(booking.total_amount_cents, &booking.id)
        .await
        .map_err(|e| AppError::Payment(format!("card gateway unavailable: {e}")))?;

    let payment = match authorization {
        CardAuthorization::Approved { auth_code } => {
            tracing::info!(booking_id = %booking.id, "card authorization approved");
            let payment = persist(
                state,
                booking,
                existing,
                PaymentMethod::CreditCard,
                PaymentStatus::Completed,
                None,
                Some(auth_code),
            )?;
            confirm_if_pending(state, booking)?;
            payment
        }
        CardAuthorization::Declined { reason } => {
            tracing::warn!(booking_id = %booking.id, reason = %reason, "card authorization declined");
            persist(
                state,
                booking,
                existing,
                PaymentMethod::CreditCard,
                PaymentStatus::Failed,
                None,
                None,
            )?
        }
    };

    let booking_status = current_status(state, &booking.id)?;
    Ok(PaymentState {
        payment,
        booking_status,
        pix: None,
    })
}

fn start_pix(
    state: &Arc<AppState>,
    booking: &Booking,
    existing: Option<Payment>,
) -> Result<PaymentState, AppError> {
    let code = generate_pix_code();
    tracing::info!(booking_id = %booking.id, "pix code issued");

    let payment = persist(
        state,
        booking,
        existing,
        PaymentMethod::Pix,
        PaymentStatus::Pending,
        Some(code),
        None,
    )?;

    // Booking stays pending until the external confirmation arrives.
    Ok(assemble_state(booking, payment))
}

fn defer_to_cash(
    state: &Arc<AppState>,
    booking: &Booking,
    existing: Option<Payment>,
) -> Result<PaymentState, AppError> {
    let payment = persist(
        state,
        booking,
        existing,
        PaymentMethod::Cash,
        PaymentStatus::Pending,
        None,
        None,
    )?;

    // The one flow where confirmation does not wait on settlement.
    confirm_if_pending(state, booking)?;

    let booking_status = current_status(state, &booking.id)?;
    Ok(PaymentState {
        payment,
        booking_status,
        pix: None,
    })
}

/// External-collaborator entry point: the PIX settlement layer tells us a
/// code was paid. Completes the payment and confirms the booking. Calling it
/// again for an already-completed payment is a no-op.
pub fn confirm_pix(state: &Arc<AppState>, booking_id: &str) -> Result<PaymentState, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, booking_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    let mut payment = {
        let db = state.db.lock().unwrap();
        queries::get_payment_by_booking(&db, booking_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("payment for booking {booking_id}")))?;

    if payment.method != PaymentMethod::Pix {
        return Err(AppError::Payment(
            "no pix payment awaiting confirmation for this booking".to_string(),
        ));
    }

    if payment.status == PaymentStatus::Completed {
        return Ok(assemble_state(&booking, payment));
    }
    if payment.status != PaymentStatus::Pending {
        return Err(AppError::Payment(format!(
            "pix payment is {} and cannot be confirmed",
            payment.status.as_str()
        )));
    }

    payment.status = PaymentStatus::Completed;
    payment.updated_at = Utc::now().naive_utc();
    {
        let db = state.db.lock().unwrap();
        queries::update_payment(&db, &payment)?;
    }
    tracing::info!(booking_id = %booking_id, "pix payment confirmed");

    confirm_if_pending(state, &booking)?;

    let booking_status = current_status(state, booking_id)?;
    Ok(PaymentState {
        payment,
        booking_status,
        pix: None,
    })
}

/// Read-only view of a booking's payment.
pub fn state_for(state: &Arc<AppState>, booking_id: &str) -> Result<PaymentState, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, booking_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    let payment = {
        let db = state.db.lock().unwrap();
        queries::get_payment_by_booking(&db, booking_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("payment for booking {booking_id}")))?;

    Ok(assemble_state(&booking, payment))
}

/// Writes the payment outcome to the single row this booking owns, creating
/// it on first use and mutating it on retries and method switches.
fn persist(
    state: &Arc<AppState>,
    booking: &Booking,
    existing: Option<Payment>,
    method: PaymentMethod,
    status: PaymentStatus,
    pix_code: Option<String>,
    auth_code: Option<String>,
) -> Result<Payment, AppError> {
    let now = Utc::now().naive_utc();

    let payment = match existing {
        Some(mut payment) => {
            payment.method = method;
            payment.status = status;
            payment.pix_code = pix_code;
            payment.auth_code = auth_code;
            payment.updated_at = now;
            let db = state.db.lock().unwrap();
            queries::update_payment(&db, &payment)?;
            payment
        }
        None => {
            let payment = Payment {
                id: uuid::Uuid::new_v4().to_string(),
                booking_id: booking.id.clone(),
                amount_cents: booking.total_amount_cents,
                method,
                status,
                pix_code,
                auth_code,
                created_at: now,
                updated_at: now,
            };
            let db = state.db.lock().unwrap();
            queries::create_payment(&db, &payment)?;
            payment
        }
    };

    Ok(payment)
}

fn confirm_if_pending(state: &Arc<AppState>, booking: &Booking) -> Result<(), AppError> {
    let current = current_status(state, &booking.id)?;
    if current == BookingStatus::Pending {
        let db = state.db.lock().unwrap();
        queries::update_booking_status(&db, &booking.id, &BookingStatus::Confirmed)?;
        tracing::info!(booking_id = %booking.id, "booking confirmed");
    }
    Ok(())
}

fn current_status(state: &Arc<AppState>, booking_id: &str) -> Result<BookingStatus, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, booking_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
    Ok(booking.status)
}

fn assemble_state(booking: &Booking, payment: Payment) -> PaymentState {
    let pix = match (&payment.method, &payment.status) {
        (PaymentMethod::Pix, PaymentStatus::Pending) => payment.pix_code.clone().map(|code| {
            PixInstructions {
                code,
                expires_at: payment.updated_at + Duration::minutes(PIX_VALIDITY_MINUTES),
            }
        }),
        _ => None,
    };

    PaymentState {
        payment,
        booking_status: booking.status,
        pix,
    }
}

fn generate_pix_code() -> String {
    format!("PIX-{}", uuid::Uuid::new_v4().simple())
}
