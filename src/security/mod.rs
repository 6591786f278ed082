pub mod captcha;
pub mod lockout;
pub mod rate_limit;
pub mod threat;

pub use lockout::LockoutTracker;
pub use rate_limit::RateLimiter;
