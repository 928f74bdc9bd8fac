pub mod credentials;
pub mod http;
pub mod memory;

pub use credentials::ServiceCredentials;
pub use http::{HttpConnector, HttpStore};
pub use memory::{MemoryConnector, MemoryStore};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Opaque document payload. The relay passes these through untouched; any
/// shape rules belong to the backing service.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A document read back from a store, identified within its collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Flatten into the `{id, ...fields}` wire shape. A payload field named
    /// `id` wins over the document id, matching the read shape clients see.
    pub fn into_json(self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.fields.len() + 1);
        map.insert("id".to_string(), serde_json::Value::String(self.id));
        for (k, v) in self.fields {
            map.insert(k, v);
        }
        serde_json::Value::Object(map)
    }
}

/// Slash-joined path into a store. Segments alternate collection / document
/// id, so a document path has an even number of segments and a collection
/// path an odd number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    pub fn new(segments: Vec<String>) -> Result<Self, StoreError> {
        if segments.is_empty() {
            return Err(StoreError::InvalidPath("empty path".into()));
        }
        if segments.iter().any(|s| s.is_empty() || s.contains('/')) {
            return Err(StoreError::InvalidPath(format!(
                "bad segment in path '{}'",
                segments.join("/")
            )));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn join(&self) -> String {
        self.segments.join("/")
    }

    /// Last segment, which is the document id for a document path.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn expect_document(&self) -> Result<(), StoreError> {
        if self.segments.len() % 2 == 0 {
            Ok(())
        } else {
            Err(StoreError::InvalidPath(format!(
                "'{}' is not a document path",
                self.join()
            )))
        }
    }

    pub fn expect_collection(&self) -> Result<(), StoreError> {
        if self.segments.len() % 2 == 1 {
            Ok(())
        } else {
            Err(StoreError::InvalidPath(format!(
                "'{}' is not a collection path",
                self.join()
            )))
        }
    }
}

/// Failures from a backing document store. These never reach clients
/// verbatim; the proxy converts them to a generic 500 and logs the detail.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid document path: {0}")]
    InvalidPath(String),

    #[error("document service transport error: {0}")]
    Transport(String),

    #[error("document service responded {status}: {body}")]
    Protocol { status: u16, body: String },
}

/// The primitives the backing document-database product provides. One
/// instance is bound to one backing project for the life of the process.
///
/// Consistency, indexing, and per-document atomicity are the backing
/// service's responsibility; implementations only carry requests across.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backing project this session is bound to.
    fn project_id(&self) -> &str;

    /// Read one document. Absent documents are `Ok(None)`, not an error.
    async fn get_doc(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// Read every document in a collection, optionally capped. Order is
    /// unspecified.
    async fn list_collection(
        &self,
        path: &DocPath,
        limit: Option<u32>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Insert a new document with a service-assigned id; returns the id.
    async fn add_doc(&self, path: &DocPath, fields: Fields) -> Result<String, StoreError>;

    /// Merge-upsert: fields absent from the payload are preserved.
    async fn set_doc(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError>;

    /// Partial update of an existing document; `NotFound` if it is absent.
    async fn update_doc(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError>;

    /// Delete if present. Deleting an absent document succeeds.
    async fn delete_doc(&self, path: &DocPath) -> Result<(), StoreError>;
}

/// Builds a live store session from parsed service credentials.
/// The session pool is generic over this so tests can connect in-memory
/// stores where production connects over HTTP.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, creds: &ServiceCredentials) -> anyhow::Result<Arc<dyn DocumentStore>>;
}
