use serde::{Deserialize, Serialize};

/// Append-only audit record emitted when the threat filter trips. Written to
/// the database and broadcast to SSE subscribers; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: i64,
    pub event_type: String,
    pub user_id: Option<String>,
    pub description: String,
    pub created_at: String,
}
