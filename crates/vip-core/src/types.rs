//! ============================================================================
//! Core Types for VIP Access
//! ============================================================================
//! Records written to the document store by a grant, plus the grant outcome.
//! Field names match the collection attributes, so every record serializes
//! straight into a document body.
//! ============================================================================

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Document;

/// Reason stored on every fraud log entry
pub const FRAUD_REASON: &str = "Fraud detected";

/// Message surfaced to the caller when a grant is refused
pub const FRAUD_MESSAGE: &str = "Access blocked";

/// Current time as an RFC 3339 UTC string with millisecond precision
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A purchaser, read from the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.map(str::to_string),
        }
    }

    /// Build a user from a stored document. Missing or non-string
    /// attributes are treated as absent.
    pub fn from_document(doc: &Document) -> Self {
        let text = |key: &str| {
            doc.data
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Self {
            id: doc.id.clone(),
            name: text("name").unwrap_or_default(),
            email: text("email"),
        }
    }
}

/// Generated username/password pair for one grant.
/// Plaintext by design: the pair is handed back to the caller once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VipCredentials {
    pub username: String,
    pub password: String,
}

/// Entry in `blocked_entities`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedEntity {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipCredentialRecord {
    pub user_id: String,
    pub product_id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub product_id: String,
    pub price: f64,
    pub billing_interval: String,
    pub status: SubscriptionStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub user_id: String,
    pub product_id: String,
    pub price: f64,
    pub billing_interval: String,
    pub status: OrderStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipAccessLogRecord {
    pub user_id: String,
    pub product_id: String,
    pub username: String,
    pub access_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivityRecord {
    pub user_id: String,
    pub activity: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudLogRecord {
    pub user_id: String,
    pub product_id: String,
    pub reason: String,
    pub created_at: String,
}

/// Result of one grant attempt.
/// Serializes as `{"status": "success" | "fraud" | "error", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GrantOutcome {
    Success { username: String, password: String },
    Fraud { message: String },
    Error { message: String },
}

impl GrantOutcome {
    pub fn fraud() -> Self {
        GrantOutcome::Fraud {
            message: FRAUD_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GrantOutcome::Success { .. })
    }

    /// Short status label ("success", "fraud", "error")
    pub fn status(&self) -> &'static str {
        match self {
            GrantOutcome::Success { .. } => "success",
            GrantOutcome::Fraud { .. } => "fraud",
            GrantOutcome::Error { .. } => "error",
        }
    }
}

impl From<VipCredentials> for GrantOutcome {
    fn from(creds: VipCredentials) -> Self {
        GrantOutcome::Success {
            username: creds.username,
            password: creds.password,
        }
    }
}
