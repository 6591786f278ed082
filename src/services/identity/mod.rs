pub mod static_accounts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub client_id: String,
}

/// Seam to the external identity layer. The service never stores credentials
/// or sessions itself; it only asks the provider to mint a session token on
/// login and to resolve a presented token back to a client.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges credentials for a session token, None on bad credentials.
    async fn authenticate(&self, identifier: &str, secret: &str) -> anyhow::Result<Option<String>>;

    /// Resolves a bearer token to the client it belongs to.
    async fn verify_token(&self, token: &str) -> anyhow::Result<Option<ClientIdentity>>;
}
