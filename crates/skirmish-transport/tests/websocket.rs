//! Loopback tests running the full websocket transport against a real
//! orchestrator and registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use skirmish_broadcast::{Broadcaster, SubscriptionRegistry};
use skirmish_orchestrator::{Orchestrator, OrchestratorConfig};
use skirmish_scenario::{InMemoryScenarios, Scenario};
use skirmish_store::MemoryStore;
use skirmish_transport::WsServer;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
  addr: SocketAddr,
  registry: Arc<SubscriptionRegistry>,
  broadcaster: Broadcaster,
  catalog: Arc<InMemoryScenarios>,
  cancel: CancellationToken,
  _tmp: tempfile::TempDir,
}

impl Drop for TestServer {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}

async fn start_server() -> TestServer {
  let tmp = tempfile::tempdir().unwrap();
  let catalog = Arc::new(InMemoryScenarios::new());
  let store = Arc::new(MemoryStore::new());
  let registry = Arc::new(SubscriptionRegistry::new());
  let broadcaster = Broadcaster::new(registry.clone());
  let orchestrator = Arc::new(Orchestrator::new(
    OrchestratorConfig {
      config_dir: tmp.path().join("configs"),
    },
    catalog.clone(),
    store,
    broadcaster.clone(),
  ));

  let server = WsServer::bind("127.0.0.1:0".parse().unwrap(), registry.clone(), orchestrator)
    .await
    .unwrap();
  let addr = server.local_addr();

  let cancel = CancellationToken::new();
  tokio::spawn(server.run(cancel.clone()));

  TestServer {
    addr,
    registry,
    broadcaster,
    catalog,
    cancel,
    _tmp: tmp,
  }
}

impl TestServer {
  async fn connect(&self) -> WsClient {
    let (ws, _response) = connect_async(format!("ws://{}", self.addr)).await.unwrap();
    ws
  }

  async fn add_scenario(&self, id: i64, name: &str, filename: &str, body: &str) {
    let script_path = self._tmp.path().join(filename);
    tokio::fs::write(&script_path, body).await.unwrap();
    self
      .catalog
      .insert(Scenario {
        id,
        name: name.to_string(),
        description: None,
        script_path,
        folder_path: None,
        config_path: None,
        last_updated: None,
      })
      .await
      .unwrap();
  }

  async fn wait_for_subscribers(&self, execution_id: &str, count: usize) {
    for _ in 0..100 {
      if self.registry.subscriber_count(execution_id).await == count {
        return;
      }
      tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("subscriber count for {execution_id} never reached {count}");
  }
}

async fn send_json(client: &mut WsClient, value: Value) {
  client
    .send(Message::Text(value.to_string()))
    .await
    .unwrap();
}

async fn next_json(client: &mut WsClient) -> Value {
  loop {
    let message = tokio::time::timeout(Duration::from_secs(10), client.next())
      .await
      .expect("timed out waiting for message")
      .expect("connection closed")
      .expect("websocket error");
    if let Message::Text(text) = message {
      return serde_json::from_str(&text).unwrap();
    }
  }
}

#[tokio::test]
async fn test_run_streams_output_then_status() {
  let server = start_server().await;
  server
    .add_scenario(
      7,
      "port_scanner",
      "scan.sh",
      "sleep 0.2\necho \"scanning 10.0.0.1\"\n",
    )
    .await;

  let mut client = server.connect().await;
  send_json(
    &mut client,
    json!({"type": "run", "scenario_id": 7, "config": {"target": "10.0.0.1"}}),
  )
  .await;

  let launched = next_json(&mut client).await;
  assert_eq!(launched["type"], "launched");
  assert_eq!(launched["execution"]["status"], "running");
  assert_eq!(
    launched["execution"]["config_snapshot"]["target"],
    "10.0.0.1"
  );

  let output = next_json(&mut client).await;
  assert_eq!(output["type"], "output");
  assert_eq!(output["text"], "scanning 10.0.0.1");

  let status = next_json(&mut client).await;
  assert_eq!(status["type"], "status");
  assert_eq!(status["status"], "completed");
  assert!(
    status["output"]
      .as_str()
      .unwrap()
      .contains("scanning 10.0.0.1")
  );
}

#[tokio::test]
async fn test_run_unknown_scenario_replies_error() {
  let server = start_server().await;
  let mut client = server.connect().await;

  send_json(&mut client, json!({"type": "run", "scenario_id": 404})).await;

  let reply = next_json(&mut client).await;
  assert_eq!(reply["type"], "error");
  assert!(reply["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_invalid_message_replies_error_and_keeps_connection() {
  let server = start_server().await;
  let mut client = server.connect().await;

  client
    .send(Message::Text("definitely not json".to_string()))
    .await
    .unwrap();

  let reply = next_json(&mut client).await;
  assert_eq!(reply["type"], "error");

  // The connection is still usable afterwards.
  send_json(&mut client, json!({"type": "run", "scenario_id": 1})).await;
  let second = next_json(&mut client).await;
  assert_eq!(second["type"], "error");
}

#[tokio::test]
async fn test_subscribe_receives_published_events() {
  let server = start_server().await;
  let mut client = server.connect().await;

  send_json(
    &mut client,
    json!({"type": "subscribe", "execution_id": "exec-1"}),
  )
  .await;
  server.wait_for_subscribers("exec-1", 1).await;

  server
    .broadcaster
    .publish_output("exec-1", "tail line".to_string())
    .await;

  let event = next_json(&mut client).await;
  assert_eq!(event["type"], "output");
  assert_eq!(event["execution_id"], "exec-1");
  assert_eq!(event["text"], "tail line");
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
  let server = start_server().await;
  let mut client = server.connect().await;

  send_json(
    &mut client,
    json!({"type": "subscribe", "execution_id": "exec-1"}),
  )
  .await;
  server.wait_for_subscribers("exec-1", 1).await;

  send_json(
    &mut client,
    json!({"type": "unsubscribe", "execution_id": "exec-1"}),
  )
  .await;
  server.wait_for_subscribers("exec-1", 0).await;

  server
    .broadcaster
    .publish_output("exec-1", "after unsubscribe".to_string())
    .await;

  let nothing = tokio::time::timeout(Duration::from_millis(300), client.next()).await;
  assert!(nothing.is_err(), "expected no delivery after unsubscribe");
}

#[tokio::test]
async fn test_disconnect_cleans_registry() {
  let server = start_server().await;
  let mut client = server.connect().await;

  send_json(
    &mut client,
    json!({"type": "subscribe", "execution_id": "exec-1"}),
  )
  .await;
  server.wait_for_subscribers("exec-1", 1).await;

  client.close(None).await.unwrap();
  drop(client);

  server.wait_for_subscribers("exec-1", 0).await;
}
