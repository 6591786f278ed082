use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha1::Sha1;

/// Signed-token lifetime. The token binds the expected answer to an expiry so
/// verification stays stateless; an expired token fails like a wrong answer.
pub const CHALLENGE_TTL_SECS: i64 = 600;

/// A small arithmetic challenge. The token is an HMAC over the expected
/// answer and the expiry, so the server keeps no per-challenge state and the
/// response never reveals the answer itself.
#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub a: u8,
    pub b: u8,
    pub expires_at: i64,
    pub token: String,
}

/// What a guest submits alongside the form: their answer plus the challenge's
/// expiry and token, echoed back verbatim.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptchaReply {
    pub answer: i64,
    pub expires_at: i64,
    pub token: String,
}

pub fn issue(secret: &str) -> Challenge {
    let mut rng = rand::thread_rng();
    let a: u8 = rng.gen_range(1..=10);
    let b: u8 = rng.gen_range(1..=10);
    let expires_at = Utc::now().timestamp() + CHALLENGE_TTL_SECS;

    Challenge {
        a,
        b,
        expires_at,
        token: sign(secret, i64::from(a) + i64::from(b), expires_at),
    }
}

pub fn verify(secret: &str, reply: &CaptchaReply) -> bool {
    verify_at(secret, reply, Utc::now().timestamp())
}

pub fn verify_at(secret: &str, reply: &CaptchaReply, now: i64) -> bool {
    if reply.expires_at <= now {
        return false;
    }
    sign(secret, reply.answer, reply.expires_at) == reply.token
}

fn sign(secret: &str, answer: i64, expires_at: i64) -> String {
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(format!("{answer}:{expires_at}").as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
