use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::RelayError;
use crate::proxy::request::{Operation, ProxyRequest};
use crate::store::{Document, DocumentStore};
use crate::AppState;

/// The main handler for all relayed document operations.
///
/// The body is taken as raw bytes so that credential checks run before
/// any parsing. A request with a bad key and a bad body fails on the
/// key.
#[tracing::instrument(skip(state, headers, body), fields(req_id = %Uuid::new_v4()))]
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    // -- 1. Extract client key --
    let presented = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(RelayError::MissingApiKey)?;

    // -- 2. Resolve it against the control plane --
    let key = state
        .keys
        .resolve(presented)
        .await?
        .ok_or(RelayError::InvalidApiKey)?;

    // -- 3. Parse the envelope --
    let request = ProxyRequest::parse(&body)?;

    // -- 4. Pick the target project --
    let project_id = match (&key.project_id, &state.config.default_project) {
        (Some(scoped), _) => scoped.clone(),
        (None, Some(default)) => default.clone(),
        (None, None) => {
            return Err(RelayError::Internal(anyhow::anyhow!(
                "key '{}' is unscoped and no default project is configured",
                key.id
            )))
        }
    };

    tracing::debug!(
        operation = request.operation.as_str(),
        path = %request.path.join(),
        project_id = %project_id,
        key_id = %key.id,
        "relaying operation"
    );

    // -- 5. Dispatch to the project's store --
    let store = state.sessions.handle_for(&project_id).await?;
    dispatch(store.as_ref(), &request, state.config.collection_limit).await
}

async fn dispatch(
    store: &dyn DocumentStore,
    request: &ProxyRequest,
    collection_limit: Option<u32>,
) -> Result<Response, RelayError> {
    let body = match request.operation {
        Operation::GetDoc => {
            let doc = store.get_doc(&request.path).await?;
            doc.map(Document::into_json).unwrap_or(Value::Null)
        }
        Operation::GetCollection => {
            let docs = store.list_collection(&request.path, collection_limit).await?;
            Value::Array(docs.into_iter().map(Document::into_json).collect())
        }
        Operation::AddDoc => {
            let id = store
                .add_doc(&request.path, request.payload_object()?)
                .await?;
            json!({ "id": id })
        }
        Operation::SetDoc => {
            store
                .set_doc(&request.path, request.payload_object()?)
                .await?;
            json!({ "id": request.path.leaf() })
        }
        Operation::UpdateDoc => {
            store
                .update_doc(&request.path, request.payload_object()?)
                .await?;
            json!({ "success": true })
        }
        Operation::DeleteDoc => {
            store.delete_doc(&request.path).await?;
            json!({ "success": true })
        }
    };
    Ok(Json(body).into_response())
}
