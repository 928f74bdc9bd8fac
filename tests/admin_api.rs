//! Tests for the admin control plane.
//!
//! These tests verify:
//! 1. The shared-secret gate, including the closed-by-default posture
//!    when no secret is configured
//! 2. Key management: create, list, revoke, and the documented 400s
//! 3. Project registration with string or inline-object credentials
//! 4. Listings never leak key secrets into project records or
//!    credential blobs into project listings

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use docrelay::config::Config;
use docrelay::store::MemoryConnector;
use docrelay::{app, AppState};

const SECRET: &str = "test-admin-secret";

struct Admin {
    router: axum::Router,
}

fn relay_with_config(config: Config) -> Admin {
    let connector = MemoryConnector::new();
    let management = connector.store("mgmt");
    let state = Arc::new(AppState::new(config, management, Arc::new(connector)));
    Admin { router: app(state) }
}

fn admin_relay(admin_secret: Option<&str>) -> Admin {
    relay_with_config(Config {
        admin_secret: admin_secret.map(str::to_string),
        ..Config::default()
    })
}

/// Like [`admin_relay`], with a default project for unscoped keys to land in.
fn admin_relay_with_default(default_project: &str) -> Admin {
    relay_with_config(Config {
        admin_secret: Some(SECRET.to_string()),
        default_project: Some(default_project.to_string()),
        ..Config::default()
    })
}

impl Admin {
    async fn request(
        &self,
        method: Method,
        uri: &str,
        secret: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(s) = secret {
            builder = builder.header("x-admin-secret", s);
        }
        let body = body.map(str::to_string).unwrap_or_default();
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(SECRET), None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(SECRET), Some(&body.to_string()))
            .await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(SECRET), None).await
    }
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_secret_is_unauthorized() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .request(Method::GET, "/api/admin/keys", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_wrong_secret_is_unauthorized() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .request(Method::GET, "/api/admin/keys", Some("guess"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_unconfigured_secret_closes_the_admin_plane() {
        // With no server-side secret the plane rejects everything,
        // including requests that happen to send an empty header.
        let admin = admin_relay(None);
        for (method, uri) in [
            (Method::GET, "/api/admin/keys"),
            (Method::POST, "/api/admin/keys"),
            (Method::DELETE, "/api/admin/keys?id=x"),
            (Method::GET, "/api/admin/projects"),
            (Method::POST, "/api/admin/projects"),
            (Method::DELETE, "/api/admin/projects?id=x"),
        ] {
            let (status, _) = admin.request(method.clone(), uri, None, Some("{}")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            let (status, _) = admin.request(method.clone(), uri, Some(""), Some("{}")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn test_health_check_needs_no_secret() {
        let admin = admin_relay(Some(SECRET));
        let (status, _) = admin.request(Method::GET, "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

mod key_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_key_returns_the_secret_once() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .post("/api/admin/keys", json!({"name": "ci", "projectId": "gameDB"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].is_string());
        assert_eq!(body["name"], "ci");
        assert_eq!(body["projectId"], "gameDB");
        assert!(body["createdAt"].is_string());

        let key = body["key"].as_str().unwrap();
        assert!(key.starts_with("proxy_"));
        assert_eq!(key.len(), "proxy_".len() + 32);
    }

    #[tokio::test]
    async fn test_unscoped_key_requires_a_default_project() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .post("/api/admin/keys", json!({"name": "reporting"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: projectId");

        let (_, body) = admin.get("/api/admin/keys").await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_key_without_scope_falls_back_to_the_default() {
        let admin = admin_relay_with_default("gameDB");
        let (status, body) = admin.post("/api/admin/keys", json!({"name": "any"})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.get("projectId").is_none());
    }

    #[tokio::test]
    async fn test_key_scope_must_be_a_non_empty_string() {
        // Rejected even with a default project configured.
        let admin = admin_relay_with_default("gameDB");
        for scope in [json!(42), json!(""), json!(["gameDB"])] {
            let (status, body) = admin
                .post("/api/admin/keys", json!({"name": "ci", "projectId": scope}))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Missing required field: projectId");
        }

        // An explicit null reads as no scope at all.
        let (status, body) = admin
            .post("/api/admin/keys", json!({"name": "ci", "projectId": null}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.get("projectId").is_none());
    }

    #[tokio::test]
    async fn test_create_key_requires_a_name() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin.post("/api/admin/keys", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: name");

        let (status, _) = admin.post("/api/admin/keys", json!({"name": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_key_body_is_an_internal_error() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .request(Method::POST, "/api/admin/keys", Some(SECRET), Some("{oops"))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_list_and_revoke_keys() {
        let admin = admin_relay(Some(SECRET));
        let (_, created) = admin
            .post("/api/admin/keys", json!({"name": "ci", "projectId": "gameDB"}))
            .await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = admin.get("/api/admin/keys").await;
        assert_eq!(status, StatusCode::OK);
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], *id);

        let (status, body) = admin
            .delete(&format!("/api/admin/keys?id={}", id))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Key deleted successfully");

        let (_, body) = admin.get("/api/admin/keys").await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revoke_requires_an_id() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin.delete("/api/admin/keys").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing key ID in query parameter");
    }
}

mod project_tests {
    use super::*;

    fn game_credentials() -> String {
        json!({"project_id": "gameDB", "endpoint": "https://docs.example.com", "secret": "s"})
            .to_string()
    }

    #[tokio::test]
    async fn test_register_project_with_credential_string() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .post(
                "/api/admin/projects",
                json!({"name": "Game", "credentials": game_credentials()}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"id": "gameDB", "name": "Game"}));
    }

    #[tokio::test]
    async fn test_register_project_with_inline_credentials() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .post(
                "/api/admin/projects",
                json!({
                    "name": "Game",
                    "credentials": {"project_id": "gameDB", "endpoint": "https://docs.example.com", "secret": "s"}
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "gameDB");
    }

    #[tokio::test]
    async fn test_register_requires_name_and_credentials() {
        let admin = admin_relay(Some(SECRET));
        for payload in [
            json!({}),
            json!({"name": "Game"}),
            json!({"credentials": game_credentials()}),
            json!({"name": "", "credentials": game_credentials()}),
            json!({"name": "Game", "credentials": ""}),
        ] {
            let (status, body) = admin.post("/api/admin/projects", payload.clone()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
            assert_eq!(body["error"], "Missing required fields: name, credentials");
        }
    }

    #[tokio::test]
    async fn test_register_rejects_undecodable_credentials() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .post(
                "/api/admin/projects",
                json!({"name": "Game", "credentials": "{not json"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON credentials format");
    }

    #[tokio::test]
    async fn test_register_requires_a_project_id_in_credentials() {
        let admin = admin_relay(Some(SECRET));
        let (status, body) = admin
            .post(
                "/api/admin/projects",
                json!({"name": "Game", "credentials": {"endpoint": "https://docs.example.com"}}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "`project_id` missing from credentials");
    }

    #[tokio::test]
    async fn test_listings_carry_identity_only() {
        let admin = admin_relay(Some(SECRET));
        admin
            .post(
                "/api/admin/projects",
                json!({"name": "Game", "credentials": game_credentials()}),
            )
            .await;

        let (status, body) = admin.get("/api/admin/projects").await;
        assert_eq!(status, StatusCode::OK);
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], json!({"id": "gameDB", "name": "Game"}));
    }

    #[tokio::test]
    async fn test_reregistration_replaces_the_record() {
        let admin = admin_relay(Some(SECRET));
        admin
            .post(
                "/api/admin/projects",
                json!({"name": "Game", "credentials": game_credentials()}),
            )
            .await;
        let (status, body) = admin
            .post(
                "/api/admin/projects",
                json!({"name": "Game v2", "credentials": game_credentials()}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Game v2");

        let (_, body) = admin.get("/api/admin/projects").await;
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["name"], "Game v2");
    }

    #[tokio::test]
    async fn test_remove_project() {
        let admin = admin_relay(Some(SECRET));
        admin
            .post(
                "/api/admin/projects",
                json!({"name": "Game", "credentials": game_credentials()}),
            )
            .await;

        let (status, body) = admin.delete("/api/admin/projects?id=gameDB").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Project deleted successfully");

        let (_, body) = admin.get("/api/admin/projects").await;
        assert!(body.as_array().unwrap().is_empty());

        let (status, body) = admin.delete("/api/admin/projects").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing project ID in query parameter");
    }
}
