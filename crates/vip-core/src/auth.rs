//! ============================================================================
//! Credential Validator - Checks a VIP username/password pair
//! ============================================================================
//! Plaintext equality against `vip_credentials`; no hashing, no rate limit.
//! ============================================================================

use std::sync::Arc;
use tracing::debug;

use crate::error::StoreResult;
use crate::store::{Collection, DocumentStore, Query};

pub struct CredentialValidator {
    store: Arc<dyn DocumentStore>,
}

impl CredentialValidator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// True iff some stored credential matches both fields exactly
    pub async fn validate(&self, username: &str, password: &str) -> StoreResult<bool> {
        let matches = self
            .store
            .list_documents(
                Collection::VipCredentials,
                &[
                    Query::equal("username", username),
                    Query::equal("password", password),
                ],
            )
            .await?;

        debug!("Credential check for {}: {} match(es)", username, matches.total);
        Ok(matches.total > 0)
    }
}
