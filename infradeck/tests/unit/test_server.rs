//! HTTP and WebSocket end-to-end tests against a live server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use infradeck::app::options::{AppOptions, ServerOptions};
use infradeck::app::state::AppState;
use infradeck::errors::DeckError;
use infradeck::filesys::dir::Dir;
use infradeck::server::serve::serve;
use infradeck::storage::layout::StorageLayout;
use infradeck::storage::memory::MemStorage;
use infradeck::storage::seed::seed_demo_data;

struct TestServer {
    addr: SocketAddr,
    base: Dir,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), DeckError>>>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let base = Dir::create_temp_dir("infradeck-server").await.unwrap();
        let mut options = AppOptions {
            layout: StorageLayout::new(base.path()),
            server: ServerOptions {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            ..Default::default()
        };
        options.executor.terraform_stages = vec!["echo applied".to_string()];

        let storage = Arc::new(MemStorage::new());
        seed_demo_data(storage.as_ref()).await.unwrap();
        let state = AppState::with_storage(storage, &options);

        let (tx, rx) = oneshot::channel::<()>();
        let (handle, addr) = serve(&options.server, Arc::new(state.server_state()), async move {
            let _ = rx.await;
        })
        .await
        .unwrap();

        Self {
            addr,
            base,
            shutdown: Some(tx),
            handle: Some(handle),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn ws_url(&self) -> Url {
        Url::parse(&format!("ws://{}/ws", self.addr)).unwrap()
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        self.base.delete().await.unwrap();
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(10), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Read frames until one of type `kind` arrives
async fn wait_for(ws: &mut WsStream, kind: &str) -> Value {
    loop {
        let event = next_json(ws).await;
        if event["type"] == kind {
            return event;
        }
    }
}

// =================================== REST ======================================== //

#[tokio::test]
async fn test_health_and_version() {
    let server = TestServer::start().await;

    let health: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "infradeck");

    let version: Value = server
        .client
        .get(server.url("/version"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));

    server.stop().await;
}

#[tokio::test]
async fn test_rest_lists_and_lookups() {
    let server = TestServer::start().await;

    let resources: Vec<Value> = server
        .client
        .get(server.url("/api/resources"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resources.len(), 5);
    assert_eq!(resources[0]["type"], "server");
    assert!(resources[0]["createdAt"].is_string());

    let config: Value = server
        .client
        .get(server.url("/api/terraform/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(config["name"], "main.tf");
    assert_eq!(config["variables"]["aws_region"], "us-west-2");

    let missing = server
        .client
        .get(server.url("/api/ansible/99"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["message"], "Ansible playbook not found");

    let deployments: Vec<Value> = server
        .client
        .get(server.url("/api/deployments"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deployments.len(), 3);
    assert_eq!(deployments[0]["status"], "in_progress");

    server.stop().await;
}

#[tokio::test]
async fn test_rest_validation_errors() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/api/terraform"))
        .json(&json!({ "name": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);

    let response = server
        .client
        .put(server.url("/api/resources/1/status"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = server
        .client
        .put(server.url("/api/resources/77/status"))
        .json(&json!({ "status": "healthy" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_rest_mutations_reach_realtime_clients() {
    let server = TestServer::start().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(server.ws_url().as_str())
        .await
        .unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "initial_data");

    let response = server
        .client
        .post(server.url("/api/ansible"))
        .json(&json!({ "name": "ping.yml", "content": "- hosts: all\n" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();

    let event = wait_for(&mut ws, "ansible_playbook_created").await;
    assert_eq!(event["playbook"]["id"], created["id"]);
    assert!(event["playbook"]["lastRun"].is_null());

    let updated: Value = server
        .client
        .put(server.url("/api/resources/2/status"))
        .json(&json!({ "status": "healthy" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["status"], "healthy");
    let event = wait_for(&mut ws, "resource_updated").await;
    assert_eq!(event["resource"]["id"], 2);

    let _ = ws.close(None).await;
    server.stop().await;
}

// ================================ WEBSOCKET ====================================== //

#[tokio::test]
async fn test_websocket_initial_data_shape() {
    let server = TestServer::start().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(server.ws_url().as_str())
        .await
        .unwrap();

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "initial_data");
    let data = &event["data"];
    for key in [
        "resources",
        "terraformConfigs",
        "ansiblePlaybooks",
        "deployments",
        "templates",
    ] {
        assert!(data[key].is_array(), "{key}");
    }
    assert_eq!(data["ansiblePlaybooks"].as_array().unwrap().len(), 3);

    let _ = ws.close(None).await;
    server.stop().await;
}

#[tokio::test]
async fn test_websocket_local_apply_round_trip() {
    let server = TestServer::start().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(server.ws_url().as_str())
        .await
        .unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "initial_data");

    ws.send(Message::Text(
        json!({ "type": "terraform_apply", "configId": 1, "executionMode": "local" })
            .to_string()
            .into(),
    ))
    .await
    .unwrap();

    let started = wait_for(&mut ws, "deployment_started").await;
    let deployment_id = started["deployment"]["id"].clone();
    assert_eq!(started["deployment"]["status"], "in_progress");

    let output = wait_for(&mut ws, "terraform_output").await;
    assert_eq!(output["configId"], 1);
    assert_eq!(output["deploymentId"], deployment_id);
    assert!(output["logs"]
        .as_str()
        .unwrap()
        .starts_with("Starting local Terraform execution...\n"));

    let completed = wait_for(&mut ws, "deployment_completed").await;
    assert_eq!(completed["deployment"]["status"], "completed");
    assert!(completed["deployment"]["completedAt"].is_string());

    let created = wait_for(&mut ws, "resource_created").await;
    assert_eq!(created["resource"]["type"], "local");

    let _ = ws.close(None).await;
    server.stop().await;
}

#[tokio::test]
async fn test_websocket_bad_message_gets_error() {
    let server = TestServer::start().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(server.ws_url().as_str())
        .await
        .unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "initial_data");

    ws.send(Message::Text("{broken".into())).await.unwrap();
    let event = next_json(&mut ws).await;
    assert_eq!(
        event,
        json!({ "type": "error", "message": "Error processing your request" })
    );

    ws.send(Message::Text(
        json!({ "type": "ansible_run", "playbookId": 404 }).to_string().into(),
    ))
    .await
    .unwrap();
    let event = next_json(&mut ws).await;
    assert_eq!(
        event,
        json!({ "type": "error", "message": "Ansible playbook not found" })
    );

    let _ = ws.close(None).await;
    server.stop().await;
}
