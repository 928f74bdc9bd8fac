//! HTTP adapter for the managed document service.
//!
//! Wire shape, all JSON under `{endpoint}/v1/projects/{project}/documents`:
//! - `GET  …/documents/<doc path>`            → `{id, fields}` or 404
//! - `GET  …/documents/<collection>[?limit=]` → `{documents: [{id, fields}]}`
//! - `POST …/documents/<collection>`          → `{id}` (service-assigned)
//! - `PATCH …/documents/<doc path>?merge=true`          merge-upsert
//! - `PATCH …/documents/<doc path>?exists=true`         partial update, 404 if absent
//! - `DELETE …/documents/<doc path>`          idempotent
//!
//! Requests authenticate with the project's service bearer secret. The
//! client's own timeouts are the only timeouts in play; the relay layers
//! no retries on top.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use super::{Connector, DocPath, Document, DocumentStore, Fields, ServiceCredentials, StoreError};

pub struct HttpStore {
    client: reqwest::Client,
    project_id: String,
    base: Url,
    bearer: String,
}

#[derive(Deserialize)]
struct DocumentBody {
    id: String,
    #[serde(default)]
    fields: Fields,
}

#[derive(Deserialize)]
struct CollectionBody {
    #[serde(default)]
    documents: Vec<DocumentBody>,
}

#[derive(Deserialize)]
struct AddedBody {
    id: String,
}

impl HttpStore {
    pub fn new(client: reqwest::Client, creds: &ServiceCredentials) -> anyhow::Result<Self> {
        if creds.endpoint.is_empty() {
            anyhow::bail!("credentials for '{}' have no endpoint", creds.project_id);
        }
        let mut base = Url::parse(&creds.endpoint)
            .map_err(|e| anyhow::anyhow!("invalid endpoint '{}': {}", creds.endpoint, e))?;
        base.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("endpoint '{}' cannot carry a path", creds.endpoint))?
            .pop_if_empty()
            .extend(["v1", "projects", creds.project_id.as_str(), "documents"]);

        Ok(Self {
            client,
            project_id: creds.project_id.clone(),
            base,
            bearer: format!("Bearer {}", creds.secret),
        })
    }

    fn url_for(&self, path: &DocPath) -> Url {
        let mut url = self.base.clone();
        // Infallible: the base was validated to carry a path at construction.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(path.segments().iter().map(String::as_str));
        }
        url
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        req.header(AUTHORIZATION, &self.bearer)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))
    }

    async fn protocol_error(resp: reqwest::Response) -> StoreError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        StoreError::Protocol { status, body }
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn get_doc(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        path.expect_document()?;
        let resp = self.send(self.client.get(self.url_for(path))).await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let body: DocumentBody = resp
                    .json()
                    .await
                    .map_err(|e| StoreError::Transport(e.to_string()))?;
                Ok(Some(Document {
                    id: body.id,
                    fields: body.fields,
                }))
            }
            _ => Err(Self::protocol_error(resp).await),
        }
    }

    async fn list_collection(
        &self,
        path: &DocPath,
        limit: Option<u32>,
    ) -> Result<Vec<Document>, StoreError> {
        path.expect_collection()?;
        let mut url = self.url_for(path);
        if let Some(n) = limit {
            url.query_pairs_mut().append_pair("limit", &n.to_string());
        }
        let resp = self.send(self.client.get(url)).await?;
        match resp.status() {
            // A collection nobody has written to yet has no documents.
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            s if s.is_success() => {
                let body: CollectionBody = resp
                    .json()
                    .await
                    .map_err(|e| StoreError::Transport(e.to_string()))?;
                Ok(body
                    .documents
                    .into_iter()
                    .map(|d| Document {
                        id: d.id,
                        fields: d.fields,
                    })
                    .collect())
            }
            _ => Err(Self::protocol_error(resp).await),
        }
    }

    async fn add_doc(&self, path: &DocPath, fields: Fields) -> Result<String, StoreError> {
        path.expect_collection()?;
        let resp = self
            .send(
                self.client
                    .post(self.url_for(path))
                    .json(&serde_json::json!({ "fields": fields })),
            )
            .await?;
        if resp.status().is_success() {
            let body: AddedBody = resp
                .json()
                .await
                .map_err(|e| StoreError::Transport(e.to_string()))?;
            Ok(body.id)
        } else {
            Err(Self::protocol_error(resp).await)
        }
    }

    async fn set_doc(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        path.expect_document()?;
        let mut url = self.url_for(path);
        url.query_pairs_mut().append_pair("merge", "true");
        let resp = self
            .send(
                self.client
                    .patch(url)
                    .json(&serde_json::json!({ "fields": fields })),
            )
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::protocol_error(resp).await)
        }
    }

    async fn update_doc(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        path.expect_document()?;
        let mut url = self.url_for(path);
        url.query_pairs_mut().append_pair("exists", "true");
        let resp = self
            .send(
                self.client
                    .patch(url)
                    .json(&serde_json::json!({ "fields": fields })),
            )
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(path.join())),
            s if s.is_success() => Ok(()),
            _ => Err(Self::protocol_error(resp).await),
        }
    }

    async fn delete_doc(&self, path: &DocPath) -> Result<(), StoreError> {
        path.expect_document()?;
        let resp = self.send(self.client.delete(self.url_for(path))).await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(()),
            s if s.is_success() => Ok(()),
            _ => Err(Self::protocol_error(resp).await),
        }
    }
}

/// Production connector: one pooled HTTP client shared by every project
/// session it creates.
#[derive(Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(16)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, creds: &ServiceCredentials) -> anyhow::Result<Arc<dyn DocumentStore>> {
        let store = HttpStore::new(self.client.clone(), creds)?;
        Ok(Arc::new(store))
    }
}
