//! Wire messages.

use serde::{Deserialize, Serialize};
use skirmish_store::Execution;

fn empty_config() -> serde_json::Value {
  serde_json::Value::Object(serde_json::Map::new())
}

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
  /// Follow an execution's live events.
  Subscribe { execution_id: String },

  /// Stop following an execution.
  Unsubscribe { execution_id: String },

  /// Launch a scenario and auto-subscribe to the new execution.
  Run {
    scenario_id: i64,
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default = "empty_config")]
    config: serde_json::Value,
  },
}

/// Direct replies to client messages. Broadcast events
/// ([`ExecutionEvent`](skirmish_broadcast::ExecutionEvent)) share the same
/// wire with their own `type` discriminators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
  /// A `run` request was accepted; the initial record is attached.
  Launched { execution: Execution },

  /// A request could not be honored. The connection stays open.
  Error { message: String },
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_subscribe_round_trip() {
    let parsed: ClientMessage =
      serde_json::from_str(r#"{"type": "subscribe", "execution_id": "abc"}"#).unwrap();
    assert_eq!(
      parsed,
      ClientMessage::Subscribe {
        execution_id: "abc".to_string()
      }
    );
  }

  #[test]
  fn test_run_defaults() {
    let parsed: ClientMessage =
      serde_json::from_str(r#"{"type": "run", "scenario_id": 7}"#).unwrap();
    match parsed {
      ClientMessage::Run {
        scenario_id,
        user_id,
        config,
      } => {
        assert_eq!(scenario_id, 7);
        assert_eq!(user_id, None);
        assert_eq!(config, json!({}));
      }
      other => panic!("unexpected message: {other:?}"),
    }
  }

  #[test]
  fn test_error_reply_tagged() {
    let reply = ServerMessage::Error {
      message: "scenario 9 not found".to_string(),
    };
    let json: serde_json::Value = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["type"], "error");
    assert_eq!(json["message"], "scenario 9 not found");
  }
}
