//! Tests for session pooling under concurrent load.
//!
//! These tests verify:
//! 1. Racing callers converge on a single cached session per project
//! 2. Every racer gets a usable handle, whichever construction won
//! 3. Failed connections leave the pool empty for later retries

use std::sync::Arc;

use docrelay::config::Config;
use docrelay::store::{DocPath, MemoryConnector};
use docrelay::AppState;

fn state_with(connector: &MemoryConnector) -> Arc<AppState> {
    let management = connector.store("mgmt");
    Arc::new(AppState::new(
        Config::default(),
        management,
        Arc::new(connector.clone()),
    ))
}

async fn register(state: &AppState, id: &str) {
    let blob = format!(
        r#"{{"project_id":"{}","endpoint":"https://docs.example.com","secret":"s"}}"#,
        id
    );
    state.registry.create(id, id, &blob).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_session() {
    let connector = MemoryConnector::new();
    let state = state_with(&connector);
    register(&state, "gameDB").await;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let state = state.clone();
        tasks.push(tokio::spawn(
            async move { state.sessions.handle_for("gameDB").await },
        ));
    }

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().expect("every racer gets a handle"));
    }

    assert_eq!(state.sessions.session_count(), 1);

    // Whichever construction won, every handle reaches the same data.
    let path = DocPath::new(vec!["scores".into(), "s1".into()]).unwrap();
    let mut fields = serde_json::Map::new();
    fields.insert("n".to_string(), serde_json::json!(1));
    handles[0].set_doc(&path, fields).await.unwrap();
    for handle in &handles {
        assert!(handle.get_doc(&path).await.unwrap().is_some());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_connections_cache_nothing() {
    let connector = MemoryConnector::new();
    connector.refuse("flaky");
    let state = state_with(&connector);
    register(&state, "flaky").await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        tasks.push(tokio::spawn(
            async move { state.sessions.handle_for("flaky").await },
        ));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_err());
    }
    assert_eq!(state.sessions.session_count(), 0);

    // Once the backend recovers the next caller connects cleanly.
    connector.allow("flaky");
    state.sessions.handle_for("flaky").await.unwrap();
    assert_eq!(state.sessions.session_count(), 1);
}
