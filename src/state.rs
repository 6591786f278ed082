use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::models::SecurityEvent;
use crate::security::{LockoutTracker, RateLimiter};
use crate::services::gateway::CardGateway;
use crate::services::identity::IdentityProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub identity: Box<dyn IdentityProvider>,
    pub cards: Box<dyn CardGateway>,
    pub rate_limiter: RateLimiter,
    pub lockouts: LockoutTracker,
    pub security_tx: broadcast::Sender<SecurityEvent>,
}
