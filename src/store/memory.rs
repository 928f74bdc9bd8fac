//! In-process document store, used by the test suites and by local
//! development setups that have no backing service to talk to.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use uuid::Uuid;

use super::{Connector, DocPath, Document, DocumentStore, Fields, ServiceCredentials, StoreError};

pub struct MemoryStore {
    project_id: String,
    collections: DashMap<String, BTreeMap<String, Fields>>,
}

impl MemoryStore {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            collections: DashMap::new(),
        }
    }

    fn split(path: &DocPath) -> (String, String) {
        let segments = path.segments();
        let parent = segments[..segments.len() - 1].join("/");
        (parent, path.leaf().to_string())
    }
}

fn merge_fields(into: &mut Fields, from: Fields) {
    for (key, value) in from {
        match (into.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_fields(existing, incoming);
            }
            (_, value) => {
                into.insert(key, value);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn get_doc(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        path.expect_document()?;
        let (collection, id) = Self::split(path);
        Ok(self.collections.get(&collection).and_then(|docs| {
            docs.get(&id).map(|fields| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
        }))
    }

    async fn list_collection(
        &self,
        path: &DocPath,
        limit: Option<u32>,
    ) -> Result<Vec<Document>, StoreError> {
        path.expect_collection()?;
        let key = path.join();
        let Some(docs) = self.collections.get(&key) else {
            return Ok(Vec::new());
        };
        let cap = limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(docs
            .iter()
            .take(cap)
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn add_doc(&self, path: &DocPath, fields: Fields) -> Result<String, StoreError> {
        path.expect_collection()?;
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .entry(path.join())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn set_doc(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        path.expect_document()?;
        let (collection, id) = Self::split(path);
        let mut docs = self.collections.entry(collection).or_default();
        match docs.get_mut(&id) {
            Some(existing) => merge_fields(existing, fields),
            None => {
                docs.insert(id, fields);
            }
        }
        Ok(())
    }

    async fn update_doc(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        path.expect_document()?;
        let (collection, id) = Self::split(path);
        let mut docs = self
            .collections
            .get_mut(&collection)
            .ok_or_else(|| StoreError::NotFound(path.join()))?;
        let existing = docs
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(path.join()))?;
        // Named fields are replaced outright, unlike the recursive set merge.
        for (key, value) in fields {
            existing.insert(key, value);
        }
        Ok(())
    }

    async fn delete_doc(&self, path: &DocPath) -> Result<(), StoreError> {
        path.expect_document()?;
        let (collection, id) = Self::split(path);
        if let Some(mut docs) = self.collections.get_mut(&collection) {
            docs.remove(&id);
        }
        Ok(())
    }
}

/// Connector that hands out shared [`MemoryStore`] instances keyed by
/// project id, so data written through one session is visible to the
/// next. Projects marked with [`refuse`](MemoryConnector::refuse)
/// simulate an unreachable backing service.
#[derive(Default, Clone)]
pub struct MemoryConnector {
    stores: Arc<DashMap<String, Arc<MemoryStore>>>,
    refused: Arc<DashSet<String>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the store backing `project_id`.
    pub fn store(&self, project_id: &str) -> Arc<MemoryStore> {
        self.stores
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new(project_id)))
            .clone()
    }

    /// Make every future connection attempt for `project_id` fail.
    pub fn refuse(&self, project_id: &str) {
        self.refused.insert(project_id.to_string());
    }

    /// Let connection attempts for `project_id` succeed again.
    pub fn allow(&self, project_id: &str) {
        self.refused.remove(project_id);
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, creds: &ServiceCredentials) -> anyhow::Result<Arc<dyn DocumentStore>> {
        if self.refused.contains(&creds.project_id) {
            anyhow::bail!("connection refused for project '{}'", creds.project_id);
        }
        Ok(self.store(&creds.project_id))
    }
}
