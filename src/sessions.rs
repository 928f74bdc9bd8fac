//! Session pool: one lazily-opened document store handle per project.
//!
//! Flow for `handle_for(project_id)`:
//! 1. Return the cached handle if one exists.
//! 2. Otherwise look the project up in the registry, parse its
//!    credentials and ask the connector for a fresh handle.
//! 3. Cache the handle and return it. Any failure along the way caches
//!    nothing, so the next request retries from scratch.
//!
//! Concurrent first requests for the same project may each build a
//! handle; the last insert wins and the map converges on one entry.
//! Handles are never evicted. A project whose credentials change keeps
//! serving through the old handle until the relay restarts.

use std::sync::Arc;

use dashmap::DashMap;

use crate::control::ProjectRegistry;
use crate::errors::RelayError;
use crate::store::{Connector, DocumentStore, ServiceCredentials};

pub struct SessionPool {
    registry: ProjectRegistry,
    connector: Arc<dyn Connector>,
    handles: DashMap<String, Arc<dyn DocumentStore>>,
}

impl SessionPool {
    pub fn new(registry: ProjectRegistry, connector: Arc<dyn Connector>) -> Self {
        Self {
            registry,
            connector,
            handles: DashMap::new(),
        }
    }

    /// Number of live project handles.
    pub fn session_count(&self) -> usize {
        self.handles.len()
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle_for(&self, project_id: &str) -> Result<Arc<dyn DocumentStore>, RelayError> {
        if let Some(handle) = self.handles.get(project_id) {
            return Ok(handle.clone());
        }

        let handle = self.open(project_id).await.map_err(|e| {
            tracing::error!(project_id, "failed to open project session: {:#}", e);
            RelayError::ConnectionUnavailable(project_id.to_string())
        })?;

        self.handles
            .insert(project_id.to_string(), handle.clone());
        tracing::info!(project_id, "opened project session");
        Ok(handle)
    }

    async fn open(&self, project_id: &str) -> anyhow::Result<Arc<dyn DocumentStore>> {
        let record = self
            .registry
            .get(project_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("project '{}' is not registered", project_id))?;
        let creds = ServiceCredentials::parse(&record.credentials)
            .map_err(|e| anyhow::anyhow!("stored credentials are unusable: {}", e))?;
        self.connector.connect(&creds).await
    }
}
