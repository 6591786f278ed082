use async_trait::async_trait;

use super::{ClientIdentity, IdentityProvider};

struct Account {
    client_id: String,
    secret: String,
    token: String,
}

/// Environment-seeded identity provider for development and tests. Accounts
/// are parsed from `CLIENT_ACCOUNTS` as comma-separated
/// `client_id:secret:token` triples; real deployments swap in a provider
/// backed by the production identity service.
pub struct StaticAccountsProvider {
    accounts: Vec<Account>,
}

impl StaticAccountsProvider {
    pub fn from_spec(spec: &str) -> Self {
        let accounts = spec
            .split(',')
            .filter_map(|entry| {
                let mut parts = entry.trim().splitn(3, ':');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(client_id), Some(secret), Some(token))
                        if !client_id.is_empty() && !token.is_empty() =>
                    {
                        Some(Account {
                            client_id: client_id.to_string(),
                            secret: secret.to_string(),
                            token: token.to_string(),
                        })
                    }
                    _ => None,
                }
            })
            .collect();

        Self { accounts }
    }
}

#[async_trait]
impl IdentityProvider for StaticAccountsProvider {
    async fn authenticate(&self, identifier: &str, secret: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .accounts
            .iter()
            .find(|a| a.client_id == identifier && a.secret == secret)
            .map(|a| a.token.clone()))
    }

    async fn verify_token(&self, token: &str) -> anyhow::Result<Option<ClientIdentity>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .accounts
            .iter()
            .find(|a| a.token == token)
            .map(|a| ClientIdentity {
                client_id: a.client_id.clone(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parses_accounts_and_authenticates() {
        let provider = StaticAccountsProvider::from_spec("alice:pin1:tok-a, bob:pin2:tok-b");

        assert_eq!(
            provider.authenticate("alice", "pin1").await.unwrap(),
            Some("tok-a".to_string())
        );
        assert_eq!(provider.authenticate("alice", "wrong").await.unwrap(), None);

        let identity = provider.verify_token("tok-b").await.unwrap().unwrap();
        assert_eq!(identity.client_id, "bob");
        assert!(provider.verify_token("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_entries_skipped() {
        let provider = StaticAccountsProvider::from_spec("broken,also:bad,ok:pin:tok");
        assert_eq!(
            provider.authenticate("ok", "pin").await.unwrap(),
            Some("tok".to_string())
        );
        assert!(provider.verify_token("").await.unwrap().is_none());
    }
}
