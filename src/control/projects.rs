//! Project registrations in the `_relay_projects` collection.
//!
//! A registration is keyed by the project id embedded in its
//! credentials blob, so re-registering a project replaces the old
//! credentials in place.

use std::sync::Arc;

use crate::models::project::{ProjectRecord, ProjectSummary};
use crate::store::{DocPath, DocumentStore, StoreError};

use super::PROJECTS_COLLECTION;

#[derive(Clone)]
pub struct ProjectRegistry {
    store: Arc<dyn DocumentStore>,
}

impl ProjectRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<ProjectRecord>, StoreError> {
        let path = DocPath::new(vec![PROJECTS_COLLECTION.to_string(), id.to_string()])?;
        let Some(doc) = self.store.get_doc(&path).await? else {
            return Ok(None);
        };
        match ProjectRecord::from_document(doc) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(project_id = %id, "malformed project record: {}", e);
                Ok(None)
            }
        }
    }

    /// Listing exposes identity only, never the credential blobs.
    pub async fn list(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        let collection = DocPath::new(vec![PROJECTS_COLLECTION.to_string()])?;
        let docs = self.store.list_collection(&collection, None).await?;
        let mut summaries = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = doc.id.clone();
            match ProjectRecord::from_document(doc) {
                Ok(record) => summaries.push(record.summary()),
                Err(e) => tracing::warn!(project_id = %id, "skipping malformed project record: {}", e),
            }
        }
        Ok(summaries)
    }

    pub async fn create(
        &self,
        id: &str,
        name: &str,
        credentials: &str,
    ) -> Result<ProjectSummary, StoreError> {
        let record = ProjectRecord {
            id: id.to_string(),
            name: name.to_string(),
            credentials: credentials.to_string(),
            created_at: chrono::Utc::now(),
        };
        let path = DocPath::new(vec![PROJECTS_COLLECTION.to_string(), id.to_string()])?;
        self.store.set_doc(&path, record.fields()).await?;
        Ok(record.summary())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = DocPath::new(vec![PROJECTS_COLLECTION.to_string(), id.to_string()])?;
        self.store.delete_doc(&path).await
    }
}
