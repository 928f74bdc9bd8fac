//! docrelay, a credential-gatekeeping relay in front of document stores.
//!
//! Clients present an API key and a `{operation, path, payload}` envelope;
//! the relay resolves the key, picks the target project and forwards the
//! operation over its pooled session. An admin plane manages keys and
//! project registrations.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cli;
pub mod config;
pub mod control;
pub mod errors;
pub mod models;
pub mod proxy;
pub mod sessions;
pub mod store;

use config::Config;
use control::{KeyStore, ProjectRegistry};
use sessions::SessionPool;
use store::{Connector, DocumentStore};

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub keys: KeyStore,
    pub registry: ProjectRegistry,
    pub sessions: SessionPool,
    pub config: Config,
}

impl AppState {
    /// Wire the control plane and session pool onto a management store
    /// handle. The same connector later serves every registered project.
    pub fn new(
        config: Config,
        management: Arc<dyn DocumentStore>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let keys = KeyStore::new(management.clone());
        let registry = ProjectRegistry::new(management);
        let sessions = SessionPool::new(registry.clone(), connector);
        Self {
            keys,
            registry,
            sessions,
            config,
        }
    }
}

/// Build the full router: health check, admin plane, relay endpoint.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.dashboard_origin.clone());

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api/admin", api::admin_router(state.clone()))
        .route("/api/proxy", post(proxy::proxy_handler))
        .with_state(state)
        // Credential blobs can be large; documents should not be.
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
}

fn cors_layer(dashboard_origin: Option<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin = origin.to_str().unwrap_or("");
            dashboard_origin.as_deref() == Some(origin)
                || origin.starts_with("http://localhost:")
                || origin.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-admin-secret"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows clients to correlate errors with relay logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    // Key material moves through these responses; never let a browser cache them.
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.remove("Server");

    resp
}
