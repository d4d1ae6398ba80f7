//! ============================================================================
//! Document Store - Collections, typed queries and the store interface
//! ============================================================================
//! Every component receives an `Arc<dyn DocumentStore>` at construction.
//! Two backends implement the trait:
//! - `AppwriteStore`: Appwrite Databases REST API over reqwest
//! - `LocalStore`: embedded redb file for offline runs and tests
//!
//! ## Usage
//! ```rust,ignore
//! use vip_core::store::{Collection, DocumentStore, Query};
//!
//! let blocked = store
//!     .list_documents(Collection::BlockedEntities, &[Query::equal("user_id", "u1")])
//!     .await?;
//! ```
//! ============================================================================

mod appwrite;
mod local;

pub use appwrite::{AppwriteConfig, AppwriteStore};
pub use local::LocalStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreResult;

/// Named collections in the VIP database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    BlockedEntities,
    FraudLogs,
    VipCredentials,
    Subscriptions,
    Orders,
    VipAccessLogs,
    UserActivity,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::BlockedEntities,
        Collection::FraudLogs,
        Collection::VipCredentials,
        Collection::Subscriptions,
        Collection::Orders,
        Collection::VipAccessLogs,
        Collection::UserActivity,
        Collection::Users,
    ];

    /// Collection id as used by the store
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::BlockedEntities => "blocked_entities",
            Collection::FraudLogs => "fraud_logs",
            Collection::VipCredentials => "vip_credentials",
            Collection::Subscriptions => "subscriptions",
            Collection::Orders => "orders",
            Collection::VipAccessLogs => "vip_access_logs",
            Collection::UserActivity => "user_activity",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Collection::ALL.iter().map(|c| c.as_str()).collect();
                format!("Unknown collection '{}'. Valid values: {}", s, valid.join(", "))
            })
    }
}

/// Filter operator. Only equality is needed by the grant workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMethod {
    Equal,
}

/// Typed listing filter: (method, attribute, values).
/// Serializes to the Appwrite JSON query form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub method: QueryMethod,
    pub attribute: String,
    pub values: Vec<Value>,
}

impl Query {
    /// `attribute == value`
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            method: QueryMethod::Equal,
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    /// Evaluate the filter against a document held in memory
    pub fn matches(&self, doc: &Document) -> bool {
        let actual = if self.attribute == "$id" {
            Some(Value::String(doc.id.clone()))
        } else {
            doc.data.get(&self.attribute).cloned()
        };

        match self.method {
            QueryMethod::Equal => actual.is_some_and(|v| self.values.contains(&v)),
        }
    }
}

/// A stored document: its id plus the attribute map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.data.get(attribute)
    }

    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(Value::as_str)
    }
}

/// Listing response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

/// Document database used by every component.
/// Writes are independent and non-transactional.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a store-generated id
    async fn create_document(&self, collection: Collection, data: Value) -> StoreResult<Document>;

    /// List documents matching all `queries` (empty slice lists everything)
    async fn list_documents(
        &self,
        collection: Collection,
        queries: &[Query],
    ) -> StoreResult<DocumentList>;

    async fn delete_document(&self, collection: Collection, document_id: &str) -> StoreResult<()>;
}

/// Serialize a typed record and create it in `collection`
pub async fn create_record<T>(
    store: &dyn DocumentStore,
    collection: Collection,
    record: &T,
) -> StoreResult<Document>
where
    T: Serialize + Sync + ?Sized,
{
    let data = serde_json::to_value(record)?;
    store.create_document(collection, data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_collection_names_roundtrip() {
        for collection in Collection::ALL {
            assert_eq!(collection.as_str().parse::<Collection>(), Ok(collection));
        }
        assert!("accounts".parse::<Collection>().is_err());
    }

    #[test]
    fn test_query_serializes_to_appwrite_form() {
        let query = Query::equal("user_id", "u1");
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"method": "equal", "attribute": "user_id", "values": ["u1"]})
        );
    }

    #[test]
    fn test_query_matches() {
        let d = doc(json!({"$id": "d1", "user_id": "u1", "price": 9.5}));

        assert!(Query::equal("user_id", "u1").matches(&d));
        assert!(!Query::equal("user_id", "u2").matches(&d));
        assert!(Query::equal("price", 9.5).matches(&d));
        assert!(Query::equal("$id", "d1").matches(&d));
        assert!(!Query::equal("missing", "u1").matches(&d));
    }

    #[test]
    fn test_query_values_are_not_interpolated() {
        // A value that would break a string-built filter is just data here
        let d = doc(json!({"$id": "d1", "username": "a=b"}));
        assert!(Query::equal("username", "a=b").matches(&d));
        assert!(!Query::equal("username", "a").matches(&d));
    }

    #[test]
    fn test_document_flattens_attributes() {
        let d = doc(json!({"$id": "abc", "name": "Alice"}));
        assert_eq!(d.id, "abc");
        assert_eq!(d.get_str("name"), Some("Alice"));
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            json!({"$id": "abc", "name": "Alice"})
        );
    }
}
