pub mod simulated;

use async_trait::async_trait;

/// Outcome of a synchronous card authorization attempt. A decline is a normal
/// business outcome, not a transport error.
#[derive(Debug, Clone)]
pub enum CardAuthorization {
    Approved { auth_code: String },
    Declined { reason: String },
}

/// Seam to the external card acquirer. Only the credit card flow touches it;
/// PIX confirmation and cash settlement never go through this trait.
#[async_trait]
pub trait CardGateway: Send + Sync {
    async fn authorize(&self, amount_cents: i64, reference: &str)
        -> anyhow::Result<CardAuthorization>;
}
