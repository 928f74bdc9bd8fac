use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use subtle::ConstantTimeEq;

use crate::errors::RelayError;
use crate::AppState;

pub mod handlers;

/// Build the admin API router.
/// All routes are relative; the caller mounts this under `/api/admin`.
pub fn admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/keys",
            get(handlers::list_keys)
                .post(handlers::create_key)
                .delete(handlers::delete_key),
        )
        .route(
            "/projects",
            get(handlers::list_projects)
                .post(handlers::create_project)
                .delete(handlers::delete_project),
        )
        .layer(middleware::from_fn_with_state(state, admin_auth))
}

/// Middleware: validates `X-Admin-Secret` against the configured admin
/// secret. With no secret configured the admin plane is closed, not
/// open: every request is rejected.
async fn admin_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, RelayError> {
    let Some(expected) = state.config.admin_secret.as_deref() else {
        tracing::error!("admin API request rejected: DOCRELAY_ADMIN_SECRET is not set");
        return Err(RelayError::AdminUnauthorized);
    };

    let provided = req
        .headers()
        .get("x-admin-secret")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(p) if bool::from(p.as_bytes().ct_eq(expected.as_bytes())) => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("admin API: invalid admin secret");
            Err(RelayError::AdminUnauthorized)
        }
        None => {
            tracing::warn!("admin API: missing X-Admin-Secret header");
            Err(RelayError::AdminUnauthorized)
        }
    }
}
