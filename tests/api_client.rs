//! HTTP client tests against a mock LocalPlace API

use localplace_cli::core::models::StateField;
use localplace_cli::core::{ApiClient, ApiError, ContainerAction};
use mockito::{Matcher, Server};
use serde_json::json;
use std::io::Write;
use std::time::Duration;

fn container_json(name: &str, running: bool) -> serde_json::Value {
    json!({
        "id": format!("{}0123456789abcdef", name.len()),
        "name": name,
        "status": if running { "running" } else { "exited" },
        "state": if running { "running" } else { "exited" },
        "image": "postgres:17",
        "ports": ["5432:5432/tcp"],
        "created": "2025-10-29T10:00:00Z",
        "running": running
    })
}

#[tokio::test]
async fn test_health() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "healthy",
                "docker_connected": true,
                "timestamp": "2025-10-29T20:42:25.695125",
                "version": "2.0.0"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let health = client.health().await.unwrap();

    assert!(health.is_healthy());
    assert!(health.docker_connected);
    assert_eq!(health.version, "2.0.0");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_containers_sends_all_flag() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::UrlEncoded("all".into(), "true".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([container_json("local-postgres", true), container_json("local-redis", false)]).to_string())
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let containers = client.list_containers(true).await.unwrap();

    assert_eq!(containers.len(), 2);
    assert_eq!(containers[0].name, "local-postgres");
    assert!(containers[0].running);
    assert_eq!(containers[1].state, StateField::Text("exited".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_container_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/containers/nope")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Container nope not found"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let err = client.get_container("nope").await.unwrap_err();

    assert!(err.is_not_found());
    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "Container nope not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_server_error_without_body_uses_reason() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/system/metrics")
        .with_status(503)
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let err = client.system_metrics().await.unwrap_err();

    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status, 503);
            assert_eq!(detail, "Service Unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_logs_tail_is_clamped() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/containers/local-redis/logs")
        .match_query(Matcher::UrlEncoded("tail".into(), "1000".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "container": "local-redis",
                "lines": ["2025-10-29T10:00:00Z Ready to accept connections"],
                "tail": 1000
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let logs = client.container_logs("local-redis", 5000).await.unwrap();

    assert_eq!(logs.lines.len(), 1);
    assert_eq!(logs.tail, 1000);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_container_stats_and_metrics() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/containers/local-postgres/stats")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "cpu_percent": 1.5,
                "memory_usage_mb": 120.0,
                "memory_limit_mb": 2048.0,
                "memory_percent": 5.86,
                "network_rx_mb": 0.4,
                "network_tx_mb": 0.1
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/system/metrics")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "cpu_percent": 21.4,
                "memory": {"total_gb": 32.0, "used_gb": 12.5, "percent": 39.1},
                "disk": {"total_gb": 512.0, "used_gb": 300.0, "percent": 58.6}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();

    let stats = client.container_stats("local-postgres").await.unwrap();
    assert_eq!(stats.memory_limit_mb, 2048.0);

    let metrics = client.system_metrics().await.unwrap();
    assert_eq!(metrics.cpu_percent, 21.4);
    assert_eq!(metrics.disk.used_gb, 300.0);
}

#[tokio::test]
async fn test_action_returns_receipt() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/containers/local-postgres/restart")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "message": "Container local-postgres restarted"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let receipt = client
        .container_action(ContainerAction::Restart, "local-postgres")
        .await
        .unwrap();

    assert_eq!(receipt.status, "success");
    assert_eq!(receipt.message, "Container local-postgres restarted");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_action_with_empty_body() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/containers/local-redis/stop")
        .with_status(204)
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let receipt = client
        .container_action(ContainerAction::Stop, "local-redis")
        .await
        .unwrap();

    assert_eq!(receipt.status, "success");
    assert_eq!(receipt.message, "Container local-redis stopped");
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let err = client.list_containers(false).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

/// Body that arrives only after `delay`, like a rebuild that takes a while
fn slow_body(delay: Duration, body: &'static str) -> impl Fn(&mut dyn Write) -> std::io::Result<()> + Send + Sync + 'static {
    move |w| {
        std::thread::sleep(delay);
        w.write_all(body.as_bytes())
    }
}

#[tokio::test]
async fn test_slow_action_outlasts_request_timeout() {
    let mut server = Server::new_async().await;
    let rebuild = server
        .mock("POST", "/api/v1/containers/local-postgres/rebuild")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(slow_body(
            Duration::from_millis(600),
            r#"{"status": "success", "message": "Container local-postgres rebuilt"}"#,
        ))
        .create_async()
        .await;

    let client = ApiClient::with_timeout(server.url(), Duration::from_millis(200))
        .unwrap()
        .with_action_timeout(Duration::from_secs(5));
    let receipt = client
        .container_action(ContainerAction::Rebuild, "local-postgres")
        .await
        .unwrap();

    assert_eq!(receipt.message, "Container local-postgres rebuilt");
    rebuild.assert_async().await;
}

#[tokio::test]
async fn test_slow_read_hits_request_timeout() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(slow_body(Duration::from_millis(600), "[]"))
        .create_async()
        .await;

    let client = ApiClient::with_timeout(server.url(), Duration::from_millis(200))
        .unwrap()
        .with_action_timeout(Duration::from_secs(5));
    let err = client.list_containers(true).await.unwrap_err();

    assert!(matches!(err, ApiError::Http(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn test_container_name_is_encoded_in_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/containers/web%2Fadmin%3Fx/stats")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "cpu_percent": 0.0,
                "memory_usage_mb": 1.0,
                "memory_limit_mb": 2.0,
                "memory_percent": 50.0,
                "network_rx_mb": 0.0,
                "network_tx_mb": 0.0
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let stats = client.container_stats("web/admin?x").await.unwrap();

    assert_eq!(stats.memory_percent, 50.0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_running_container_stats_skips_failures() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::UrlEncoded("all".into(), "false".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([container_json("local-postgres", true), container_json("local-redis", true)]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/containers/local-postgres/stats")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "cpu_percent": 3.0,
                "memory_usage_mb": 256.0,
                "memory_limit_mb": 2048.0,
                "memory_percent": 12.5,
                "network_rx_mb": 0.0,
                "network_tx_mb": 0.0
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/v1/containers/local-redis/stats")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Container local-redis is not running"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url()).unwrap();
    let stats = client.running_container_stats().await.unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats["local-postgres"].memory_usage_mb, 256.0);
    assert!(!stats.contains_key("local-redis"));
    list.assert_async().await;
}
