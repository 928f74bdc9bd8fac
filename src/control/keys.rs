//! API key records in the `_relay_api_keys` collection.
//!
//! Lookups go to the control plane on every request. Nothing here is
//! cached, so deleting a key record revokes it immediately.

use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::models::key::ApiKey;
use crate::store::{DocPath, DocumentStore, StoreError};

use super::KEYS_COLLECTION;

#[derive(Clone)]
pub struct KeyStore {
    store: Arc<dyn DocumentStore>,
}

impl KeyStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolve a presented key to its record, or `None` if no record
    /// matches. Comparison is constant-time per candidate record.
    pub async fn resolve(&self, presented: &str) -> Result<Option<ApiKey>, StoreError> {
        let collection = DocPath::new(vec![KEYS_COLLECTION.to_string()])?;
        for doc in self.store.list_collection(&collection, None).await? {
            let id = doc.id.clone();
            let record = match ApiKey::from_document(doc) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(key_id = %id, "skipping malformed key record: {}", e);
                    continue;
                }
            };
            if record.key.as_bytes().ct_eq(presented.as_bytes()).into() {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Mint a new key. The secret is 16 bytes from the OS RNG, hex
    /// encoded under a fixed prefix so keys are recognizable in logs
    /// and configs.
    pub async fn create(
        &self,
        name: &str,
        project_id: Option<String>,
    ) -> Result<ApiKey, StoreError> {
        let mut random_bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut random_bytes);
        let record = ApiKey {
            id: String::new(),
            name: name.to_string(),
            key: format!("proxy_{}", hex::encode(random_bytes)),
            project_id,
            created_at: Utc::now(),
        };

        let collection = DocPath::new(vec![KEYS_COLLECTION.to_string()])?;
        let id = self.store.add_doc(&collection, record.fields()).await?;
        Ok(ApiKey { id, ..record })
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>, StoreError> {
        let collection = DocPath::new(vec![KEYS_COLLECTION.to_string()])?;
        let docs = self.store.list_collection(&collection, None).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = doc.id.clone();
            match ApiKey::from_document(doc) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(key_id = %id, "skipping malformed key record: {}", e),
            }
        }
        Ok(records)
    }

    /// Remove a key record. Succeeds whether or not the record exists;
    /// either way the key no longer resolves afterwards.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = DocPath::new(vec![KEYS_COLLECTION.to_string(), id.to_string()])?;
        self.store.delete_doc(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn key_store() -> KeyStore {
        KeyStore::new(Arc::new(MemoryStore::new("mgmt")))
    }

    #[tokio::test]
    async fn created_keys_resolve_by_secret() {
        let keys = key_store();
        let created = keys.create("ci", Some("gameDB".into())).await.unwrap();
        assert!(created.key.starts_with("proxy_"));
        assert_eq!(created.key.len(), "proxy_".len() + 32);

        let resolved = keys.resolve(&created.key).await.unwrap().unwrap();
        assert_eq!(resolved.id, created.id);
        assert_eq!(resolved.project_id.as_deref(), Some("gameDB"));
    }

    #[tokio::test]
    async fn unknown_secrets_do_not_resolve() {
        let keys = key_store();
        keys.create("ci", None).await.unwrap();
        assert!(keys.resolve("proxy_feedfacefeedfacefeedfacefeedface").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_key_revokes_it_immediately() {
        let keys = key_store();
        let created = keys.create("ci", None).await.unwrap();
        assert!(keys.resolve(&created.key).await.unwrap().is_some());

        keys.delete(&created.id).await.unwrap();
        assert!(keys.resolve(&created.key).await.unwrap().is_none());
        assert!(keys.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_missing_key_succeeds() {
        let keys = key_store();
        keys.delete("no-such-id").await.unwrap();
    }

    #[tokio::test]
    async fn generated_secrets_are_distinct() {
        let keys = key_store();
        let a = keys.create("a", None).await.unwrap();
        let b = keys.create("b", None).await.unwrap();
        assert_ne!(a.key, b.key);
    }
}
