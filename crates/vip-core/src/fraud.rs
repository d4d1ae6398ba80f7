//! ============================================================================
//! Fraud Screener - Static email rules plus blocklist lookup
//! ============================================================================
//! Rules run in order and stop at the first hit:
//! 1. missing/empty email, or email ending in a disposable domain
//! 2. any `blocked_entities` entry for the user id
//!
//! A failed blocklist query is returned to the caller, never guessed.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::{Collection, DocumentStore, Query};
use crate::types::User;

/// Disposable email domain refused by default
pub const DEFAULT_BLOCKED_EMAIL_DOMAIN: &str = "@tempmail.com";

/// Why a user was (or was not) flagged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum FraudVerdict {
    Clean,
    MissingEmail,
    /// Email ends with this blocked domain suffix
    DisposableEmail(String),
    /// User id present in `blocked_entities`
    Blocklisted,
}

impl FraudVerdict {
    pub fn is_fraud(&self) -> bool {
        !matches!(self, FraudVerdict::Clean)
    }
}

/// Classifies users as fraudulent before any access is provisioned
pub struct FraudScreener {
    store: Arc<dyn DocumentStore>,
    blocked_email_domains: Vec<String>,
}

impl FraudScreener {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_blocked_domains(store, vec![DEFAULT_BLOCKED_EMAIL_DOMAIN.to_string()])
    }

    /// Screener also refusing emails that end with any of `domains`
    /// (matched literally, e.g. `"@mailinator.com"`). The default
    /// `@tempmail.com` rule is always kept.
    pub fn with_blocked_domains(store: Arc<dyn DocumentStore>, domains: Vec<String>) -> Self {
        let mut blocked_email_domains = vec![DEFAULT_BLOCKED_EMAIL_DOMAIN.to_string()];
        for domain in domains {
            if !domain.is_empty() && !blocked_email_domains.contains(&domain) {
                blocked_email_domains.push(domain);
            }
        }

        Self {
            store,
            blocked_email_domains,
        }
    }

    /// Email rule only, no store access
    pub fn check_email(&self, user: &User) -> FraudVerdict {
        let email = match user.email.as_deref() {
            Some(email) if !email.is_empty() => email,
            _ => return FraudVerdict::MissingEmail,
        };

        self.blocked_email_domains
            .iter()
            .find(|domain| email.ends_with(domain.as_str()))
            .map(|domain| FraudVerdict::DisposableEmail(domain.clone()))
            .unwrap_or(FraudVerdict::Clean)
    }

    /// Full screening: email rule, then blocklist lookup
    pub async fn screen(&self, user: &User) -> StoreResult<FraudVerdict> {
        let verdict = self.check_email(user);
        if verdict.is_fraud() {
            warn!("User {} flagged by email rule: {:?}", user.id, verdict);
            return Ok(verdict);
        }

        let blocked = self
            .store
            .list_documents(
                Collection::BlockedEntities,
                &[Query::equal("user_id", user.id.as_str())],
            )
            .await?;

        if blocked.total > 0 {
            warn!(
                "User {} found in blocklist ({} entries)",
                user.id, blocked.total
            );
            return Ok(FraudVerdict::Blocklisted);
        }

        debug!("User {} passed fraud screening", user.id);
        Ok(FraudVerdict::Clean)
    }

    pub async fn is_fraud(&self, user: &User) -> StoreResult<bool> {
        Ok(self.screen(user).await?.is_fraud())
    }
}
