use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Boundary error for both the proxy and the admin plane.
///
/// Every variant maps to a status plus an `{error, details?}` JSON body.
/// Backing-store detail is logged server-side and never reaches the caller;
/// only admin endpoints carry a `details` field.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Unauthorized: Missing API Key.")]
    MissingApiKey,

    #[error("Unauthorized: Invalid API Key.")]
    InvalidApiKey,

    #[error("Unauthorized")]
    AdminUnauthorized,

    #[error("Invalid JSON body")]
    MalformedBody,

    #[error("Missing required fields: operation, path")]
    MissingOperationFields,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Missing required fields: name, credentials")]
    MissingProjectFields,

    #[error("Missing {0} ID in query parameter")]
    MissingQueryId(&'static str),

    #[error("Invalid JSON credentials format")]
    InvalidCredentialFormat,

    #[error("`project_id` missing from credentials")]
    MissingProjectId,

    #[error("could not connect to project '{0}'")]
    ConnectionUnavailable(String),

    #[error("backing store error: {0}")]
    Backing(#[from] StoreError),

    #[error("{error}")]
    AdminInternal { error: &'static str, details: String },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RelayError {
    /// Wrap an admin-plane failure with the context string the client sees.
    pub fn admin(error: &'static str, err: impl std::fmt::Display) -> Self {
        RelayError::AdminInternal {
            error,
            details: err.to_string(),
        }
    }
}

impl From<crate::store::credentials::CredentialsError> for RelayError {
    fn from(err: crate::store::credentials::CredentialsError) -> Self {
        use crate::store::credentials::CredentialsError;
        match err {
            CredentialsError::Malformed => RelayError::InvalidCredentialFormat,
            CredentialsError::MissingProjectId => RelayError::MissingProjectId,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            RelayError::MissingApiKey
            | RelayError::InvalidApiKey
            | RelayError::AdminUnauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            RelayError::MalformedBody
            | RelayError::MissingOperationFields
            | RelayError::UnsupportedOperation(_)
            | RelayError::MissingField(_)
            | RelayError::MissingProjectFields
            | RelayError::MissingQueryId(_)
            | RelayError::InvalidCredentialFormat
            | RelayError::MissingProjectId => (StatusCode::BAD_REQUEST, self.to_string(), None),
            RelayError::ConnectionUnavailable(project_id) => {
                tracing::error!(project_id = %project_id, "no usable connection for project");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not connect to the project database.".to_string(),
                    None,
                )
            }
            RelayError::Backing(e) => {
                tracing::error!("document store operation failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                    None,
                )
            }
            RelayError::AdminInternal { error, details } => {
                tracing::error!("{}: {}", error, details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    (*error).to_string(),
                    Some(details.clone()),
                )
            }
            RelayError::Internal(e) => {
                tracing::error!("internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(d) => json!({ "error": error, "details": d }),
            None => json!({ "error": error }),
        };

        (status, Json(body)).into_response()
    }
}
