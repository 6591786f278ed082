use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingParty, BookingStatus};
use crate::services::identity::ClientIdentity;
use crate::state::AppState;

/// Caller-supplied part of a booking. Duration and total amount are never
/// accepted from the outside; they are derived from the referenced service.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub establishment_id: String,
    pub service_id: String,
    pub booking_date: NaiveDateTime,
    pub notes: Option<String>,
}

pub fn create_client_booking(
    state: &Arc<AppState>,
    client: &ClientIdentity,
    input: NewBooking,
) -> Result<Booking, AppError> {
    let party = BookingParty::Client {
        client_id: client.client_id.clone(),
    };
    create(state, party, input)
}

/// Guest-create path. Callers must have run the submission through the trust
/// pipeline first; this function only enforces the shape of the record.
pub fn create_guest_booking(
    state: &Arc<AppState>,
    name: String,
    phone: String,
    email: Option<String>,
    input: NewBooking,
) -> Result<Booking, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("guest name is required".to_string()));
    }
    if phone.trim().is_empty() {
        return Err(AppError::Validation("guest phone is required".to_string()));
    }

    let party = BookingParty::Guest {
        name: name.trim().to_string(),
        phone: phone.trim().to_string(),
        email: email.filter(|e| !e.trim().is_empty()),
    };
    create(state, party, input)
}

fn create(
    state: &Arc<AppState>,
    party: BookingParty,
    input: NewBooking,
) -> Result<Booking, AppError> {
    if input.establishment_id.trim().is_empty() {
        return Err(AppError::Validation(
            "establishment_id is required".to_string(),
        ));
    }
    if input.service_id.trim().is_empty() {
        return Err(AppError::Validation("service_id is required".to_string()));
    }

    let service = {
        let db = state.db.lock().unwrap();
        queries::get_service(&db, &input.service_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("service {}", input.service_id)))?;

    if service.establishment_id != input.establishment_id {
        return Err(AppError::Validation(
            "service does not belong to this establishment".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        establishment_id: input.establishment_id,
        service_id: service.id.clone(),
        party,
        booking_date: input.booking_date,
        duration_minutes: service.duration_minutes,
        total_amount_cents: service.price_cents,
        status: BookingStatus::Pending,
        notes: input.notes.filter(|n| !n.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking)?;
    }

    tracing::info!(
        booking_id = %booking.id,
        establishment_id = %booking.establishment_id,
        service = %service.name,
        guest = booking.is_guest(),
        "booking created"
    );

    Ok(booking)
}

/// Applies a status change, enforcing the transition graph. Anything not on
/// the graph is rejected without touching the record.
pub fn update_status(
    state: &Arc<AppState>,
    id: &str,
    new_status: BookingStatus,
) -> Result<Booking, AppError> {
    let mut booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if !booking.status.can_transition_to(new_status) {
        return Err(AppError::InvalidTransition {
            from: booking.status,
            to: new_status,
        });
    }

    {
        let db = state.db.lock().unwrap();
        queries::update_booking_status(&db, id, &new_status)?;
    }

    tracing::info!(
        booking_id = %id,
        from = booking.status.as_str(),
        to = new_status.as_str(),
        "booking status updated"
    );

    booking.status = new_status;
    booking.updated_at = Utc::now().naive_utc();
    Ok(booking)
}

pub fn get(state: &Arc<AppState>, id: &str) -> Result<Booking, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, id)?
    };
    booking.ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

pub fn list_for_client(state: &Arc<AppState>, client_id: &str) -> Result<Vec<Booking>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(queries::list_bookings_for_client(&db, client_id)?)
}

pub fn list_for_establishment(
    state: &Arc<AppState>,
    establishment_id: &str,
    status_filter: Option<&str>,
    limit: i64,
) -> Result<Vec<Booking>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(queries::list_bookings_for_establishment(
        &db,
        establishment_id,
        status_filter,
        limit,
    )?)
}
