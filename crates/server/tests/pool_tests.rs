//! Session pool tests: single-flight handshakes, fingerprint isolation,
//! and idle reaping.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use splunk_config::ConfigField;
use splunk_mcp_server::pool::{PoolError, SessionPool};

use common::config_for;

/// Mount the token-validation endpoint the handshake hits.
async fn mount_server_info(mock_server: &MockServer, expect: u64) {
    Mock::given(method("GET"))
        .and(path("/services/server/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entry": [{"name": "server-info", "content": {
                "serverName": "splunk-01", "version": "9.2.0"
            }}]
        })))
        .expect(expect)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn concurrent_acquires_perform_exactly_one_handshake() {
    let mock_server = MockServer::start().await;
    // The mock asserts the invariant: one handshake for N racers.
    mount_server_info(&mock_server, 1).await;

    let pool = Arc::new(SessionPool::new());
    let config = config_for(&mock_server.uri());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let pool = Arc::clone(&pool);
        let config = config.clone();
        handles.push(tokio::spawn(async move { pool.acquire(&config).await }));
    }
    for handle in handles {
        let session = handle.await.expect("join").expect("acquire");
        assert_eq!(session.fingerprint(), config.fingerprint());
    }

    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn distinct_fingerprints_get_distinct_sessions() {
    let server_a = MockServer::start().await;
    let server_b = MockServer::start().await;
    mount_server_info(&server_a, 1).await;
    mount_server_info(&server_b, 1).await;

    let pool = SessionPool::new();
    let config_a = config_for(&server_a.uri());
    let config_b = config_for(&server_b.uri());

    let session_a = pool.acquire(&config_a).await.expect("acquire a");
    let session_b = pool.acquire(&config_b).await.expect("acquire b");

    assert_ne!(session_a.fingerprint(), session_b.fingerprint());
    assert_eq!(pool.len(), 2);
}

#[tokio::test]
async fn credential_change_mints_a_new_session() {
    let mock_server = MockServer::start().await;
    mount_server_info(&mock_server, 2).await;

    let pool = SessionPool::new();
    let config = config_for(&mock_server.uri());
    let mut rotated = config.clone();
    rotated
        .set_field(ConfigField::Token, "rotated-token", "test")
        .unwrap();

    pool.acquire(&config).await.expect("acquire");
    pool.acquire(&rotated).await.expect("acquire rotated");
    assert_eq!(pool.len(), 2);
}

#[tokio::test]
async fn rejected_credentials_are_auth_failed_and_not_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/server/info"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "messages": [{"type": "ERROR", "text": "Invalid credentials"}]
        })))
        .mount(&mock_server)
        .await;

    let pool = SessionPool::new();
    let config = config_for(&mock_server.uri());

    let err = pool.acquire(&config).await.unwrap_err();
    assert!(matches!(err, PoolError::AuthFailed(_)), "got {err:?}");
    assert_eq!(pool.len(), 0);
}

#[tokio::test]
async fn unreachable_host_is_unreachable() {
    let pool = SessionPool::new();
    // Port 1 on localhost refuses connections.
    let config = config_for("http://127.0.0.1:1");

    let err = pool.acquire(&config).await.unwrap_err();
    assert!(matches!(err, PoolError::Unreachable(_)), "got {err:?}");
}

#[tokio::test]
async fn reaper_drops_idle_sessions_and_keeps_fresh_ones() {
    let mock_server = MockServer::start().await;
    mount_server_info(&mock_server, 2).await;

    let pool = SessionPool::with_idle_ttl(Duration::from_millis(50));
    let config = config_for(&mock_server.uri());

    pool.acquire(&config).await.expect("acquire");
    assert_eq!(pool.len(), 1);

    // Fresh session survives a sweep.
    assert_eq!(pool.reap(), 0);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(pool.reap(), 1);
    assert!(pool.is_empty());

    // A later acquire re-opens (second expected handshake).
    pool.acquire(&config).await.expect("reacquire");
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn failed_handshake_does_not_poison_the_gate() {
    let mock_server = MockServer::start().await;
    // First attempt rejected, second accepted.
    Mock::given(method("GET"))
        .and(path("/services/server/info"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "messages": [{"type": "ERROR", "text": "Invalid credentials"}]
        })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/server/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entry": [{"name": "server-info", "content": {"serverName": "s", "version": "9"}}]
        })))
        .mount(&mock_server)
        .await;

    let pool = SessionPool::new();
    let config = config_for(&mock_server.uri());

    assert!(pool.acquire(&config).await.is_err());
    // The pool never retries on its own, but the caller may.
    assert!(pool.acquire(&config).await.is_ok());
}
