//! Action flow: POST, then refresh the container list from the server

use localplace_cli::core::actions::{self, ContainerAction};
use localplace_cli::core::models::Container;
use localplace_cli::core::{ApiClient, ApiError, Poller};
use mockito::{Matcher, Server};
use serde_json::json;

fn list_body(running: bool) -> String {
    json!([{
        "id": "4f1c2d3e4a5b6c7d",
        "name": "local-postgres",
        "status": if running { "running" } else { "exited" },
        "state": if running { "running" } else { "exited" },
        "image": "postgres:17",
        "ports": [],
        "created": "2025-10-29T10:00:00Z",
        "running": running
    }])
    .to_string()
}

fn entry(name: &str, running: bool) -> serde_json::Value {
    json!({
        "id": format!("{}-0123456789", name),
        "name": name,
        "status": if running { "running" } else { "exited" },
        "state": if running { "running" } else { "exited" },
        "image": "busybox",
        "ports": [],
        "created": "2025-10-29T10:00:00Z",
        "running": running
    })
}

fn containers_poller(api: &ApiClient) -> Poller<Vec<Container>> {
    let api = api.clone();
    Poller::start("containers", None, move || {
        let api = api.clone();
        async move { api.list_containers(true).await }
    })
}

async fn wait_for_first_load(poller: &Poller<Vec<Container>>) {
    let mut rx = poller.subscribe();
    let _ = rx
        .wait_for(|resource| resource.value().is_some() || resource.last_error().is_some())
        .await
        .unwrap();
}

fn is_running(poller: &Poller<Vec<Container>>) -> Option<bool> {
    poller.value().and_then(|list| list.first().map(|c| c.running))
}

#[tokio::test]
async fn test_start_refreshes_to_server_state() {
    let mut server = Server::new_async().await;
    let stopped = server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(list_body(false))
        .create_async()
        .await;

    let api = ApiClient::new(server.url()).unwrap();
    let poller = containers_poller(&api);
    wait_for_first_load(&poller).await;
    assert_eq!(is_running(&poller), Some(false));

    stopped.remove_async().await;
    let running = server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(list_body(true))
        .expect(1)
        .create_async()
        .await;
    let start = server
        .mock("POST", "/api/v1/containers/local-postgres/start")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "message": "Container local-postgres started"}"#)
        .expect(1)
        .create_async()
        .await;

    let receipt = actions::perform(&api, &poller, ContainerAction::Start, "local-postgres")
        .await
        .unwrap();

    assert_eq!(receipt.message, "Container local-postgres started");
    // No waiting: the refresh completed before perform returned
    assert_eq!(is_running(&poller), Some(true));
    start.assert_async().await;
    running.assert_async().await;
}

#[tokio::test]
async fn test_failed_action_skips_refresh() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(list_body(false))
        .expect(1)
        .create_async()
        .await;
    server
        .mock("POST", "/api/v1/containers/local-postgres/start")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "port 5432 already allocated"}"#)
        .create_async()
        .await;

    let api = ApiClient::new(server.url()).unwrap();
    let poller = containers_poller(&api);
    wait_for_first_load(&poller).await;

    let err = actions::perform(&api, &poller, ContainerAction::Start, "local-postgres")
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "port 5432 already allocated");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(is_running(&poller), Some(false));
    // Only the initial load hit the list endpoint
    list.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_api_leaves_list_empty() {
    // Nothing listens on port 9 on a test machine
    let api = ApiClient::new("http://127.0.0.1:9").unwrap();
    let poller = containers_poller(&api);
    wait_for_first_load(&poller).await;

    assert!(poller.value().is_none());
    assert!(poller.snapshot().last_error().is_some());
}

#[tokio::test]
async fn test_start_all_skips_running_and_refreshes_once() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                entry("local-postgres", true),
                entry("local-redis", false),
                entry("local-minio", false)
            ])
            .to_string(),
        )
        // Initial load plus one refresh after the whole batch
        .expect(2)
        .create_async()
        .await;
    let postgres = server
        .mock("POST", "/api/v1/containers/local-postgres/start")
        .expect(0)
        .create_async()
        .await;
    let redis = server
        .mock("POST", "/api/v1/containers/local-redis/start")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "success", "message": "Container local-redis started"}"#)
        .expect(1)
        .create_async()
        .await;
    let minio = server
        .mock("POST", "/api/v1/containers/local-minio/start")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "port 9000 already allocated"}"#)
        .expect(1)
        .create_async()
        .await;

    let api = ApiClient::new(server.url()).unwrap();
    let poller = containers_poller(&api);
    wait_for_first_load(&poller).await;

    let report = actions::perform_all(&api, &poller, ContainerAction::Start).await;

    let names: Vec<&str> = report.outcomes.iter().map(|o| o.container.as_str()).collect();
    assert_eq!(names, vec!["local-redis", "local-minio"]);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.summary(), "1 of 2 containers started, 1 failed");

    postgres.assert_async().await;
    redis.assert_async().await;
    minio.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn test_stop_all_with_nothing_running_skips_refresh() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/v1/containers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([entry("local-redis", false)]).to_string())
        .expect(1)
        .create_async()
        .await;
    let stop = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let api = ApiClient::new(server.url()).unwrap();
    let poller = containers_poller(&api);
    wait_for_first_load(&poller).await;

    let report = actions::perform_all(&api, &poller, ContainerAction::Stop).await;

    assert!(report.outcomes.is_empty());
    assert_eq!(report.summary(), "No containers to stop");
    stop.assert_async().await;
    list.assert_async().await;
}
