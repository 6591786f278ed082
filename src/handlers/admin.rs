use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingStatus, Service};
use crate::services::booking;
use crate::state::AppState;

use super::bookings::BookingResponse;

#[allow(clippy::result_large_err)]
fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response());
    }
    Ok(())
}

// GET /api/admin/status
#[derive(Serialize)]
pub struct StatusResponse {
    upcoming_confirmed_count: i64,
    pending_payment_count: i64,
    security_event_count: i64,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db).map_err(internal_error)?
    };

    Ok(Json(StatusResponse {
        upcoming_confirmed_count: stats.upcoming_confirmed_count,
        pending_payment_count: stats.pending_payment_count,
        security_event_count: stats.security_event_count,
    }))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub establishment_id: String,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let bookings = booking::list_for_establishment(
        &state,
        &query.establishment_id,
        query.status.as_deref(),
        limit,
    )
    .map_err(IntoResponse::into_response)?;

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let new_status = BookingStatus::try_parse(&body.status).ok_or_else(|| {
        AppError::Validation(format!("unknown status: {}", body.status)).into_response()
    })?;

    let updated = booking::update_status(&state, &id, new_status)
        .map_err(IntoResponse::into_response)?;
    Ok(Json(updated.into()))
}

// POST /api/admin/services
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub establishment_id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub category: String,
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateServiceRequest>,
) -> Result<Json<Service>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.name.trim().is_empty() || body.establishment_id.trim().is_empty() {
        return Err(
            AppError::Validation("name and establishment_id are required".to_string())
                .into_response(),
        );
    }
    if body.price_cents < 0 || body.duration_minutes <= 0 {
        return Err(AppError::Validation(
            "price must be non-negative and duration positive".to_string(),
        )
        .into_response());
    }

    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        establishment_id: body.establishment_id,
        name: body.name.trim().to_string(),
        price_cents: body.price_cents,
        duration_minutes: body.duration_minutes,
        category: body.category,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_service(&db, &service).map_err(internal_error)?;
    }

    Ok(Json(service))
}

// GET /api/admin/services
#[derive(Deserialize)]
pub struct ServicesQuery {
    pub establishment_id: String,
}

pub async fn get_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ServicesQuery>,
) -> Result<Json<Vec<Service>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db, &query.establishment_id).map_err(internal_error)?
    };

    Ok(Json(services))
}

// GET /api/admin/security/events
#[derive(Deserialize)]
pub struct SecurityEventsQuery {
    pub since: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn get_security_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SecurityEventsQuery>,
) -> Result<Json<serde_json::Value>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let events = {
        let db = state.db.lock().unwrap();
        match query.since {
            Some(since) => queries::get_security_events_since(&db, since),
            None => queries::get_security_events(&db, query.limit.unwrap_or(100)),
        }
        .map_err(internal_error)?
    };

    Ok(Json(serde_json::to_value(events).unwrap_or_default()))
}

// GET /api/admin/security/stream — SSE feed of security events
#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
    pub last_id: Option<i64>,
}

pub async fn security_events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, Response> {
    // Auth via query param (EventSource can't set headers)
    let token = query.token.as_deref().unwrap_or("");
    if token != state.config.admin_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response());
    }

    let last_id = query.last_id.unwrap_or(0);

    // Catch up on missed events from the database
    let catchup_events = {
        let db = state.db.lock().unwrap();
        queries::get_security_events_since(&db, last_id).unwrap_or_default()
    };

    let rx = state.security_tx.subscribe();

    let catchup_stream = tokio_stream::iter(catchup_events.into_iter().map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data).event("security_event"))
    }));

    let live_stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("security_event")))
        }
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let keepalive_stream = tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30))),
        |_| Ok(Event::default().comment("keepalive")),
    );

    let combined = catchup_stream.chain(live_stream);
    let merged = StreamExt::merge(combined, keepalive_stream);

    Ok(Sse::new(merged))
}

fn internal_error(e: anyhow::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
        .into_response()
}
