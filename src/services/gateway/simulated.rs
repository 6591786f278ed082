use async_trait::async_trait;

use super::{CardAuthorization, CardGateway};

/// Stand-in acquirer: approves everything and mints an opaque authorization
/// code. Declines and transport failures are exercised through test doubles.
pub struct SimulatedCardGateway;

#[async_trait]
impl CardGateway for SimulatedCardGateway {
    async fn authorize(
        &self,
        amount_cents: i64,
        reference: &str,
    ) -> anyhow::Result<CardAuthorization> {
        tracing::info!(amount_cents, reference, "simulated card authorization");
        Ok(CardAuthorization::Approved {
            auth_code: format!("AUTH-{}", uuid::Uuid::new_v4().simple()),
        })
    }
}
