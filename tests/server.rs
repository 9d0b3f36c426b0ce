use std::net::SocketAddr;
use std::process::Stdio;
use std::time::{Duration, Instant};

use gateway::{ServerConfig, ServerError, api, bind, build_router, serve, start};
use reqwest::StatusCode;
use tokio::process::Command;
use tokio::task::JoinSet;

const BIN: &str = env!("CARGO_BIN_EXE_gateway");

fn localhost() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn spawn_server() -> SocketAddr {
    let router = build_router(api::routes()).unwrap();
    let listener = bind(localhost()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, router));
    addr
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_concurrent_pings_get_independent_responses() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/ping");

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let client = client.clone();
        let url = url.clone();
        tasks.spawn(async move {
            let response = client.get(&url).send().await.unwrap();
            let status = response.status();
            let content_type = response.headers()[reqwest::header::CONTENT_TYPE].clone();
            let body = response.text().await.unwrap();
            (status, content_type, body)
        });
    }

    let mut completed = 0;
    while let Some(result) = tasks.join_next().await {
        let (status, content_type, body) = result.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        assert_eq!(body, r#"{"message":"pong"}"#);
        completed += 1;
    }
    assert_eq!(completed, 16);
}

#[tokio::test]
async fn test_unregistered_path_over_the_wire_is_404() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/ping"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(format!("http://{addr}/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bind_fails_when_port_is_taken() {
    let occupied = bind(localhost()).await.unwrap();
    let addr = occupied.local_addr().unwrap();

    let err = bind(addr).await.unwrap_err();
    match err {
        ServerError::Bind { addr: failed, .. } => assert_eq!(failed, addr),
        other => panic!("expected bind error, got {other:?}"),
    }

    let err = start(ServerConfig::new(addr, api::routes()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }));
    assert!(err.to_string().starts_with(&format!("failed to bind {addr}")));
}

#[tokio::test]
async fn test_process_exits_non_zero_when_port_is_taken() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let status = tokio::time::timeout(
        Duration::from_secs(10),
        Command::new(BIN)
            .env("HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status(),
    )
    .await
    .expect("process should exit instead of running")
    .unwrap();

    assert!(!status.success());
    drop(occupied);
}

#[tokio::test]
async fn test_process_rejects_malformed_port() {
    let status = tokio::time::timeout(
        Duration::from_secs(10),
        Command::new(BIN)
            .env("PORT", "not-a-port")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status(),
    )
    .await
    .expect("process should exit instead of running")
    .unwrap();

    assert!(!status.success());
}

#[tokio::test]
async fn test_process_serves_ping_shortly_after_launch() {
    let port = free_port();
    let mut child = Command::new(BIN)
        .env("HOST", "127.0.0.1")
        .env("PORT", port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{port}/ping");
    let deadline = Instant::now() + Duration::from_secs(10);

    let response = loop {
        match client.get(&url).send().await {
            Ok(response) => break response,
            Err(_) if Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(e) => panic!("server did not come up within 10s: {e}"),
        }
    };

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json, serde_json::json!({"message": "pong"}));

    child.kill().await.unwrap();
}
