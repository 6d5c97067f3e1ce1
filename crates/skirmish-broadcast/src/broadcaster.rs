//! Event publication.

use std::sync::Arc;

use chrono::Utc;
use skirmish_store::ExecutionStatus;
use tracing::debug;

use crate::event::ExecutionEvent;
use crate::registry::SubscriptionRegistry;

/// Publishes execution events to every current subscriber.
///
/// Within one execution, events reach each subscriber in publication order
/// (each subscriber is an FIFO channel and publication happens from the
/// execution's single driver task). Across executions no ordering is
/// promised.
#[derive(Debug, Clone)]
pub struct Broadcaster {
  registry: Arc<SubscriptionRegistry>,
}

impl Broadcaster {
  pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
    Self { registry }
  }

  /// The registry this broadcaster publishes through.
  pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
    &self.registry
  }

  /// Publish a line of output to the execution's subscribers.
  pub async fn publish_output(&self, execution_id: &str, text: String) {
    self
      .deliver(
        execution_id,
        ExecutionEvent::Output {
          execution_id: execution_id.to_string(),
          text,
          timestamp: Utc::now(),
        },
      )
      .await;
  }

  /// Publish a status change, optionally with the full output snapshot.
  pub async fn publish_status(
    &self,
    execution_id: &str,
    status: ExecutionStatus,
    output: Option<String>,
  ) {
    self
      .deliver(
        execution_id,
        ExecutionEvent::Status {
          execution_id: execution_id.to_string(),
          status,
          output,
          timestamp: Utc::now(),
        },
      )
      .await;
  }

  /// Best-effort delivery: subscribers whose channel has closed are
  /// withdrawn from the registry rather than retried.
  async fn deliver(&self, execution_id: &str, event: ExecutionEvent) {
    let subscribers = self.registry.subscribers_of(execution_id).await;
    for subscriber in subscribers {
      if !subscriber.send(event.clone()) {
        debug!(
          execution_id = %execution_id,
          subscriber_id = %subscriber.id(),
          "dropping subscriber with closed channel"
        );
        self.registry.unsubscribe(execution_id, subscriber.id()).await;
      }
    }
  }
}
