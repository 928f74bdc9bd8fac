//! Admin API handlers for key and project management.
//!
//! Bodies are parsed by hand from raw bytes so parse failures surface
//! through the same `{error, details}` channel as other admin faults.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::RelayError;
use crate::store::ServiceCredentials;
use crate::AppState;

#[derive(Deserialize)]
pub struct DeleteQuery {
    id: Option<String>,
}

// ── API keys ──

pub async fn list_keys(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, RelayError> {
    let keys = state
        .keys
        .list()
        .await
        .map_err(|e| RelayError::admin("Internal Server Error", e))?;
    Ok(Json(keys))
}

pub async fn create_key(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, RelayError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| RelayError::admin("Internal Server Error", e))?;

    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or(RelayError::MissingField("name"))?;
    let project_id = match payload.get("projectId") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(_) => return Err(RelayError::MissingField("projectId")),
    };
    // With no default project configured, every key must carry its own scope.
    if project_id.is_none() && state.config.default_project.is_none() {
        return Err(RelayError::MissingField("projectId"));
    }

    let created = state
        .keys
        .create(name, project_id)
        .await
        .map_err(|e| RelayError::admin("Internal Server Error", e))?;
    tracing::info!(key_id = %created.id, name = %created.name, "created API key");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, RelayError> {
    let id = query.id.ok_or(RelayError::MissingQueryId("key"))?;
    state
        .keys
        .delete(&id)
        .await
        .map_err(|e| RelayError::admin("Internal Server Error", e))?;
    tracing::info!(key_id = %id, "deleted API key");
    Ok(Json(json!({ "message": "Key deleted successfully" })))
}

// ── Projects ──

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, RelayError> {
    let projects = state
        .registry
        .list()
        .await
        .map_err(|e| RelayError::admin("Failed to list projects", e))?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, RelayError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| RelayError::admin("Failed to add project", e))?;

    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or(RelayError::MissingProjectFields)?;

    // The credentials blob may arrive as a JSON string or inline object.
    let raw = match payload.get("credentials") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Object(obj)) => Value::Object(obj.clone()).to_string(),
        _ => return Err(RelayError::MissingProjectFields),
    };

    let creds = ServiceCredentials::parse(&raw)?;

    let summary = state
        .registry
        .create(&creds.project_id, name, &raw)
        .await
        .map_err(|e| RelayError::admin("Failed to add project", e))?;
    tracing::info!(project_id = %summary.id, "registered project");
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, RelayError> {
    let id = query.id.ok_or(RelayError::MissingQueryId("project"))?;
    // Keys scoped to the project stay behind; they stop working once
    // the registration is gone.
    state
        .registry
        .delete(&id)
        .await
        .map_err(|e| RelayError::admin("Failed to delete project", e))?;
    tracing::info!(project_id = %id, "deleted project");
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}
