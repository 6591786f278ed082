use std::sync::Arc;

use crate::errors::AppError;
use crate::security::captcha::{self, CaptchaReply};
use crate::security::threat;
use crate::services::audit;
use crate::state::AppState;

/// One shared attempt budget for the anonymous booking endpoint.
pub const GUEST_BOOKING_ACTION: &str = "guest_booking";
pub const GUEST_MAX_ATTEMPTS: usize = 10;
pub const GUEST_WINDOW_MS: i64 = 60_000;

/// Gate for unauthenticated writes. The checks run strictly in order and
/// short-circuit on the first failure: threat screen, then rate limit, then
/// captcha. Only a submission that clears all three may reach the
/// guest-create path.
pub fn vet_guest_booking(
    state: &Arc<AppState>,
    fields: &mut [(&str, &mut String)],
    reply: &CaptchaReply,
) -> Result<(), AppError> {
    screen_fields(state, fields)?;

    if !state
        .rate_limiter
        .check(GUEST_BOOKING_ACTION, GUEST_MAX_ATTEMPTS, GUEST_WINDOW_MS)
    {
        return Err(AppError::RateLimited);
    }

    if !captcha::verify(&state.config.captcha_secret, reply) {
        return Err(AppError::CaptchaFailed);
    }

    Ok(())
}

/// Free-text screening. Injection-shaped input rejects the whole submission;
/// script-shaped input is sanitized in place. Both leave an audit record.
pub fn screen_fields(
    state: &Arc<AppState>,
    fields: &mut [(&str, &mut String)],
) -> Result<(), AppError> {
    for (name, value) in fields.iter_mut() {
        if threat::looks_like_sql_injection(value) {
            audit::record_security_event(
                state,
                "suspicious_paste",
                None,
                &format!("injection pattern in guest field '{name}'"),
            );
            return Err(AppError::Validation(format!(
                "field '{name}' contains disallowed content"
            )));
        }

        if threat::looks_like_xss(value) {
            audit::record_security_event(
                state,
                "xss_attempt",
                None,
                &format!("script pattern stripped from guest field '{name}'"),
            );
            **value = threat::strip_tags(value);
        }
    }
    Ok(())
}
