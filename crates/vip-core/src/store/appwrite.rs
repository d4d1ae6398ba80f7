//! ============================================================================
//! Appwrite Store - Document store backed by the Appwrite Databases REST API
//! ============================================================================
//! Connection settings are optional at construction; a missing one surfaces
//! as `StoreError::NotConfigured` on the first request.
//! ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{Collection, Document, DocumentList, DocumentStore, Query};
use crate::error::{StoreError, StoreResult};

/// Appwrite asks the server to generate the document id when given this
const UNIQUE_ID: &str = "unique()";

/// Connection settings for an Appwrite project database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppwriteConfig {
    /// API endpoint including the version segment, e.g. `https://host/v1`
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub database_id: Option<String>,
}

/// Document store client for one Appwrite database
pub struct AppwriteStore {
    client: reqwest::Client,
    config: AppwriteConfig,
}

/// Settings resolved for a single request
struct Resolved<'a> {
    endpoint: &'a str,
    project_id: &'a str,
    api_key: &'a str,
    database_id: &'a str,
}

impl AppwriteStore {
    pub fn new(config: AppwriteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &AppwriteConfig {
        &self.config
    }

    fn resolve(&self) -> StoreResult<Resolved<'_>> {
        fn required<'a>(value: &'a Option<String>, name: &'static str) -> StoreResult<&'a str> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .ok_or(StoreError::NotConfigured(name))
        }

        Ok(Resolved {
            endpoint: required(&self.config.endpoint, "APPWRITE_ENDPOINT")?,
            project_id: required(&self.config.project_id, "APPWRITE_PROJECT_ID")?,
            api_key: required(&self.config.api_key, "APPWRITE_API_KEY")?,
            database_id: required(&self.config.database_id, "APPWRITE_DATABASE_ID")?,
        })
    }

    fn documents_url(settings: &Resolved<'_>, collection: Collection) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            settings.endpoint.trim_end_matches('/'),
            settings.database_id,
            collection.as_str()
        )
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        settings: &Resolved<'_>,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Appwrite-Project", settings.project_id)
            .header("X-Appwrite-Key", settings.api_key)
            .header("Content-Type", "application/json")
    }
}

/// Turn a non-2xx response into `StoreError::Api`, preferring the
/// `message` field of the Appwrite error body
async fn check_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn create_document(&self, collection: Collection, data: Value) -> StoreResult<Document> {
        let settings = self.resolve()?;
        let url = Self::documents_url(&settings, collection);
        debug!("Creating document in {}", collection);

        let body = CreateDocumentRequest {
            document_id: UNIQUE_ID,
            data,
        };

        let response = self
            .request(reqwest::Method::POST, &url, &settings)
            .json(&body)
            .send()
            .await?;

        let document: Document = check_status(response).await?.json().await?;
        debug!("Created document {} in {}", document.id, collection);
        Ok(document)
    }

    async fn list_documents(
        &self,
        collection: Collection,
        queries: &[Query],
    ) -> StoreResult<DocumentList> {
        let settings = self.resolve()?;
        let url = Self::documents_url(&settings, collection);

        let params = queries
            .iter()
            .map(|q| Ok(("queries[]", serde_json::to_string(q)?)))
            .collect::<StoreResult<Vec<_>>>()?;

        let response = self
            .request(reqwest::Method::GET, &url, &settings)
            .query(&params)
            .send()
            .await?;

        let list: DocumentList = check_status(response).await?.json().await?;
        debug!(
            "Listed {} of {} documents in {}",
            list.documents.len(),
            list.total,
            collection
        );
        Ok(list)
    }

    async fn delete_document(&self, collection: Collection, document_id: &str) -> StoreResult<()> {
        let settings = self.resolve()?;
        let url = format!("{}/{}", Self::documents_url(&settings, collection), document_id);

        let response = self
            .request(reqwest::Method::DELETE, &url, &settings)
            .send()
            .await?;
        check_status(response).await?;

        debug!("Deleted document {} from {}", document_id, collection);
        Ok(())
    }
}

// ============================================================================
// Appwrite API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentRequest {
    document_id: &'static str,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> AppwriteConfig {
        AppwriteConfig {
            endpoint: Some("https://cloud.example.com/v1/".into()),
            project_id: Some("proj".into()),
            api_key: Some("key".into()),
            database_id: Some("vipdb".into()),
        }
    }

    #[test]
    fn test_documents_url_trims_trailing_slash() {
        let store = AppwriteStore::new(full_config());
        let settings = store.resolve().unwrap();
        assert_eq!(
            AppwriteStore::documents_url(&settings, Collection::VipAccessLogs),
            "https://cloud.example.com/v1/databases/vipdb/collections/vip_access_logs/documents"
        );
    }

    #[test]
    fn test_missing_setting_is_reported_on_use() {
        let store = AppwriteStore::new(AppwriteConfig {
            api_key: None,
            ..full_config()
        });
        match store.resolve() {
            Err(StoreError::NotConfigured(name)) => assert_eq!(name, "APPWRITE_API_KEY"),
            _ => panic!("expected NotConfigured"),
        }
    }

    #[test]
    fn test_blank_setting_counts_as_missing() {
        let store = AppwriteStore::new(AppwriteConfig {
            endpoint: Some("  ".into()),
            ..full_config()
        });
        assert!(matches!(
            store.resolve(),
            Err(StoreError::NotConfigured("APPWRITE_ENDPOINT"))
        ));
    }

    #[test]
    fn test_create_request_body() {
        let body = CreateDocumentRequest {
            document_id: UNIQUE_ID,
            data: serde_json::json!({"user_id": "u1"}),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"documentId": "unique()", "data": {"user_id": "u1"}})
        );
    }
}
