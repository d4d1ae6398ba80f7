//! ============================================================================
//! VIP-CORE: Fraud-screened VIP access provisioning
//! ============================================================================
//! This crate handles all backend logic for VIP access grants:
//! - Fraud screening (email rules + blocklist lookup)
//! - Credential generation and validation
//! - The grant workflow writing the credential/subscription/order ledger
//! - Batch runs over a CSV product catalog and the users collection
//! - Document store backends (Appwrite REST, embedded redb)
//! ============================================================================

pub mod auth;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fraud;
pub mod provisioning;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use types::*;
pub use auth::CredentialValidator;
pub use batch::{BatchDriver, BatchReport};
pub use catalog::{read_products, Product};
pub use config::{AppConfig, StoreBackend};
pub use credentials::generate_credentials;
pub use error::{CatalogError, ConfigError, StoreError, StoreResult};
pub use fraud::{FraudScreener, FraudVerdict};
pub use provisioning::Provisioner;
pub use store::{AppwriteStore, Collection, DocumentStore, LocalStore, Query};
