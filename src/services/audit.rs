use std::sync::Arc;

use crate::db::queries;
use crate::models::SecurityEvent;
use crate::state::AppState;

/// Appends an audit record and pushes it to live SSE subscribers. Auditing is
/// best-effort: a failed insert is logged, never surfaced to the caller whose
/// request tripped the filter.
pub fn record_security_event(
    state: &Arc<AppState>,
    event_type: &str,
    user_id: Option<&str>,
    description: &str,
) {
    let event_id = {
        let db = state.db.lock().unwrap();
        queries::insert_security_event(&db, event_type, user_id, description)
    };

    match event_id {
        Ok(id) => {
            tracing::warn!(event_type, description, "security event recorded");
            let event = SecurityEvent {
                id,
                event_type: event_type.to_string(),
                user_id: user_id.map(|s| s.to_string()),
                description: description.to_string(),
                created_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            };
            // Broadcast to SSE subscribers; ignore if no receivers
            let _ = state.security_tx.send(event);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to record security event");
        }
    }
}
