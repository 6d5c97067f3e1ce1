//! Websocket server.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use skirmish_broadcast::{Subscriber, SubscriptionRegistry};
use skirmish_orchestrator::Orchestrator;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::message::{ClientMessage, ServerMessage};

/// The websocket transport.
///
/// Owns the listener socket; [`run`](Self::run) accepts connections until
/// the cancellation token fires. Each connection runs in its own task, so
/// a slow or dead viewer never holds up the accept loop or other viewers.
pub struct WsServer {
  listener: TcpListener,
  local_addr: SocketAddr,
  registry: Arc<SubscriptionRegistry>,
  orchestrator: Arc<Orchestrator>,
}

impl WsServer {
  /// Bind the listener. Use port 0 to let the OS pick (tests do).
  pub async fn bind(
    addr: SocketAddr,
    registry: Arc<SubscriptionRegistry>,
    orchestrator: Arc<Orchestrator>,
  ) -> Result<Self, TransportError> {
    let listener = TcpListener::bind(addr)
      .await
      .map_err(|e| TransportError::Bind { addr, source: e })?;
    let local_addr = listener
      .local_addr()
      .map_err(|e| TransportError::LocalAddr { source: e })?;

    Ok(Self {
      listener,
      local_addr,
      registry,
      orchestrator,
    })
  }

  /// The address the listener is actually bound to.
  pub fn local_addr(&self) -> SocketAddr {
    self.local_addr
  }

  /// Accept connections until cancelled.
  pub async fn run(self, cancel: CancellationToken) {
    info!(addr = %self.local_addr, "websocket transport listening");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("websocket transport shutting down");
          break;
        }
        accepted = self.listener.accept() => {
          match accepted {
            Ok((stream, peer)) => {
              tokio::spawn(handle_connection(
                stream,
                peer,
                self.registry.clone(),
                self.orchestrator.clone(),
              ));
            }
            Err(e) => {
              warn!(error = %e, "failed to accept connection");
            }
          }
        }
      }
    }
  }
}

/// Serve one websocket connection until it closes.
async fn handle_connection(
  stream: TcpStream,
  peer: SocketAddr,
  registry: Arc<SubscriptionRegistry>,
  orchestrator: Arc<Orchestrator>,
) {
  let ws = match accept_async(stream).await {
    Ok(ws) => ws,
    Err(e) => {
      warn!(peer = %peer, error = %e, "websocket handshake failed");
      return;
    }
  };
  let (mut sink, mut source) = ws.split();

  let (subscriber, mut events) = Subscriber::new();
  let subscriber_id = subscriber.id();
  info!(peer = %peer, subscriber_id = %subscriber_id, "viewer connected");

  loop {
    tokio::select! {
      event = events.recv() => {
        // The sender half lives in `subscriber`, so the channel only closes
        // when this function drops it on exit.
        let Some(event) = event else { break };
        match serde_json::to_string(&event) {
          Ok(json) => {
            if sink.send(Message::Text(json)).await.is_err() {
              break;
            }
          }
          Err(e) => warn!(error = %e, "failed to serialize event"),
        }
      }
      message = source.next() => {
        match message {
          Some(Ok(Message::Text(text))) => {
            let reply = process_message(&text, &subscriber, &registry, &orchestrator).await;
            if let Some(reply) = reply {
              match serde_json::to_string(&reply) {
                Ok(json) => {
                  if sink.send(Message::Text(json)).await.is_err() {
                    break;
                  }
                }
                Err(e) => warn!(error = %e, "failed to serialize reply"),
              }
            }
          }
          // Pings are answered by tungstenite itself; binary frames have
          // no meaning on this wire.
          Some(Ok(Message::Close(_))) | None => break,
          Some(Ok(_)) => {}
          Some(Err(e)) => {
            debug!(peer = %peer, error = %e, "websocket read failed");
            break;
          }
        }
      }
    }
  }

  registry.connection_closed(subscriber_id).await;
  info!(peer = %peer, subscriber_id = %subscriber_id, "viewer disconnected");
}

/// Apply one client message, returning a direct reply if one is due.
async fn process_message(
  text: &str,
  subscriber: &Subscriber,
  registry: &Arc<SubscriptionRegistry>,
  orchestrator: &Arc<Orchestrator>,
) -> Option<ServerMessage> {
  let message: ClientMessage = match serde_json::from_str(text) {
    Ok(message) => message,
    Err(e) => {
      return Some(ServerMessage::Error {
        message: format!("invalid message: {e}"),
      });
    }
  };

  match message {
    ClientMessage::Subscribe { execution_id } => {
      registry.subscribe(&execution_id, subscriber.clone()).await;
      None
    }
    ClientMessage::Unsubscribe { execution_id } => {
      registry.unsubscribe(&execution_id, subscriber.id()).await;
      None
    }
    ClientMessage::Run {
      scenario_id,
      user_id,
      config,
    } => match orchestrator.launch(scenario_id, user_id, config).await {
      Ok(execution) => {
        // Subscribe before replying so no event published after the
        // launch can slip past this viewer.
        registry.subscribe(&execution.id, subscriber.clone()).await;
        Some(ServerMessage::Launched { execution })
      }
      Err(e) => Some(ServerMessage::Error {
        message: e.to_string(),
      }),
    },
  }
}
