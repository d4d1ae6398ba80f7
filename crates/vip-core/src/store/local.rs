// ============================================================================
// LocalStore - Embedded Document Store (redb)
// ============================================================================
// One table per collection, documents stored as JSON bytes keyed by id.
// Default path: ~/.vip-access/store.redb (override via VIP_DB_PATH env var)
// ============================================================================

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Collection, Document, DocumentList, DocumentStore, Query};
use crate::error::{StoreError, StoreResult};

// Table definitions
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const SEQUENCE_KEY: &str = "sequence";

/// Creation-order attribute added to every locally stored document
pub const SEQUENCE_ATTRIBUTE: &str = "$sequence";

fn collection_table(collection: Collection) -> TableDefinition<'static, &'static str, &'static [u8]> {
    TableDefinition::new(collection.as_str())
}

fn local<E: Into<redb::Error>>(context: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Local {
        context,
        source: e.into(),
    }
}

/// Embedded document store
pub struct LocalStore {
    db: Database,
    path: PathBuf,
}

impl LocalStore {
    /// Open (or create) the store at the given path, creating every
    /// collection table
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening local store at: {}", path.display());

        let db = Database::create(&path).map_err(local("open database"))?;

        // Ensure tables exist by doing a write transaction
        let write_txn = db.begin_write().map_err(local("begin write"))?;
        {
            let _ = write_txn.open_table(META).map_err(local("create meta table"))?;
            for collection in Collection::ALL {
                let _ = write_txn
                    .open_table(collection_table(collection))
                    .map_err(local("create collection table"))?;
            }
        }
        write_txn.commit().map_err(local("commit init"))?;

        info!("Local store ready");

        Ok(Self { db, path })
    }

    /// `~/.vip-access/store.redb`
    pub fn default_path() -> StoreResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Cannot determine home directory",
            ))
        })?;
        Ok(home.join(".vip-access").join("store.redb"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn create_document(&self, collection: Collection, data: Value) -> StoreResult<Document> {
        let Value::Object(mut data) = data else {
            return Err(StoreError::Serialization(serde::de::Error::custom(
                "document data must be a JSON object",
            )));
        };

        let write_txn = self.db.begin_write().map_err(local("begin write"))?;
        let document;
        {
            let mut meta = write_txn.open_table(META).map_err(local("open meta table"))?;
            let sequence = meta
                .get(SEQUENCE_KEY)
                .map_err(local("read sequence"))?
                .map(|v| v.value())
                .unwrap_or(0)
                + 1;
            meta.insert(SEQUENCE_KEY, sequence)
                .map_err(local("write sequence"))?;

            data.insert(SEQUENCE_ATTRIBUTE.to_string(), Value::from(sequence));
            document = Document {
                id: Uuid::new_v4().simple().to_string(),
                data,
            };

            let value = serde_json::to_vec(&document)?;
            let mut table = write_txn
                .open_table(collection_table(collection))
                .map_err(local("open collection table"))?;
            table
                .insert(document.id.as_str(), value.as_slice())
                .map_err(local("insert document"))?;
        }
        write_txn.commit().map_err(local("commit"))?;

        debug!("Stored document {} in {}", document.id, collection);
        Ok(document)
    }

    async fn list_documents(
        &self,
        collection: Collection,
        queries: &[Query],
    ) -> StoreResult<DocumentList> {
        let read_txn = self.db.begin_read().map_err(local("begin read"))?;
        let table = read_txn
            .open_table(collection_table(collection))
            .map_err(local("open collection table"))?;

        let mut documents = Vec::new();
        for entry in table.iter().map_err(local("iterate documents"))? {
            let (_key, value) = entry.map_err(local("read entry"))?;
            let document: Document = serde_json::from_slice(value.value())?;
            if queries.iter().all(|q| q.matches(&document)) {
                documents.push(document);
            }
        }

        documents.sort_by_key(|d| d.get(SEQUENCE_ATTRIBUTE).and_then(Value::as_u64).unwrap_or(0));

        Ok(DocumentList {
            total: documents.len() as u64,
            documents,
        })
    }

    async fn delete_document(&self, collection: Collection, document_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write().map_err(local("begin write"))?;
        let removed;
        {
            let mut table = write_txn
                .open_table(collection_table(collection))
                .map_err(local("open collection table"))?;
            removed = table
                .remove(document_id)
                .map_err(local("remove document"))?
                .is_some();
        }
        write_txn.commit().map_err(local("commit delete"))?;

        if !removed {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: document_id.to_string(),
            });
        }

        debug!("Deleted document {} from {}", document_id, collection);
        Ok(())
    }
}
