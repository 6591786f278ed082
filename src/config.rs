use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub captcha_secret: String,
    pub pix_webhook_secret: String,
    pub client_accounts: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "parlor.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            captcha_secret: env::var("CAPTCHA_SECRET")
                .unwrap_or_else(|_| "dev-captcha-secret".to_string()),
            pix_webhook_secret: env::var("PIX_WEBHOOK_SECRET").unwrap_or_default(),
            client_accounts: env::var("CLIENT_ACCOUNTS").unwrap_or_default(),
        }
    }
}
