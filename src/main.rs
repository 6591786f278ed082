use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use parlor::config::AppConfig;
use parlor::db;
use parlor::handlers;
use parlor::security::{LockoutTracker, RateLimiter};
use parlor::services::gateway::simulated::SimulatedCardGateway;
use parlor::services::gateway::CardGateway;
use parlor::services::identity::static_accounts::StaticAccountsProvider;
use parlor::services::identity::IdentityProvider;
use parlor::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let identity: Box<dyn IdentityProvider> =
        Box::new(StaticAccountsProvider::from_spec(&config.client_accounts));
    let cards: Box<dyn CardGateway> = Box::new(SimulatedCardGateway);

    if config.pix_webhook_secret.is_empty() {
        tracing::warn!("PIX_WEBHOOK_SECRET not set, pix confirmation signature checks disabled");
    }

    let (security_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        identity,
        cards,
        rate_limiter: RateLimiter::new(),
        lockouts: LockoutTracker::new(),
        security_tx,
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route("/api/guest/captcha", get(handlers::guest::get_captcha))
        .route(
            "/api/guest/bookings",
            post(handlers::guest::create_guest_booking),
        )
        .route(
            "/api/guest/bookings/:id",
            get(handlers::guest::get_guest_booking),
        )
        .route(
            "/api/payments/initiate",
            post(handlers::payments::initiate_payment),
        )
        .route(
            "/api/payments/:booking_id",
            get(handlers::payments::get_payment),
        )
        .route(
            "/api/payments/pix/confirm",
            post(handlers::payments::confirm_pix),
        )
        .route("/api/admin/status", get(handlers::admin::get_status))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            post(handlers::admin::update_booking_status),
        )
        .route("/api/admin/services", post(handlers::admin::create_service))
        .route("/api/admin/services", get(handlers::admin::get_services))
        .route(
            "/api/admin/security/events",
            get(handlers::admin::get_security_events),
        )
        .route(
            "/api/admin/security/stream",
            get(handlers::admin::security_events_stream),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
