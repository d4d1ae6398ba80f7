//! ============================================================================
//! Error Types - Store, catalog and configuration failures
//! ============================================================================

use thiserror::Error;

/// Failures talking to a document store (remote or embedded)
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required connection setting was absent when the store was first used
    #[error("Document store is not configured: {0} is not set")]
    NotConfigured(&'static str),

    #[error("HTTP request to document store failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer from the remote API
    #[error("Document store API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("Local store failure ({context}): {source}")]
    Local {
        context: &'static str,
        #[source]
        source: redb::Error,
    },

    #[error("Failed to (de)serialize document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reading the product catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to open product file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed product file: {0}")]
    Csv(#[from] csv::Error),
}

/// Invalid process configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown store backend '{0}'. Valid values: appwrite, local")]
    UnknownBackend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_names_variable() {
        let err = StoreError::NotConfigured("APPWRITE_ENDPOINT");
        assert!(err.to_string().contains("APPWRITE_ENDPOINT"));
    }

    #[test]
    fn test_api_error_display() {
        let err = StoreError::Api {
            status: 404,
            message: "Collection not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "Document store API error 404: Collection not found"
        );
    }
}
