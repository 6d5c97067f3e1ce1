//! Subscription registry.
//!
//! Tracks which live connections want events for which execution. The
//! registry is an explicit object constructed once at process start and
//! passed by reference to both the orchestrator side (via
//! [`Broadcaster`](crate::Broadcaster)) and the transport layer - never
//! ambient global state - so it can be exercised in tests without a real
//! transport.

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::event::ExecutionEvent;

/// Identity of one subscriber connection.
pub type SubscriberId = Uuid;

/// A handle through which one connection receives events.
///
/// Cheap to clone; the same handle may be registered for several
/// executions, in which case all their events arrive on the one channel.
#[derive(Debug, Clone)]
pub struct Subscriber {
  id: SubscriberId,
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl Subscriber {
  /// Create a subscriber handle and the receiving end of its channel.
  pub fn new() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
      Self {
        id: Uuid::new_v4(),
        sender,
      },
      receiver,
    )
  }

  pub fn id(&self) -> SubscriberId {
    self.id
  }

  /// Deliver an event. Returns false if the receiving end is gone.
  pub(crate) fn send(&self, event: ExecutionEvent) -> bool {
    self.sender.send(event).is_ok()
  }
}

/// Registry of live subscriptions, keyed by execution id.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
  subscriptions: Mutex<HashMap<String, HashMap<SubscriberId, Subscriber>>>,
}

impl SubscriptionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register interest in an execution. Idempotent for the same
  /// (execution, subscriber) pair.
  pub async fn subscribe(&self, execution_id: &str, subscriber: Subscriber) {
    let mut subscriptions = self.subscriptions.lock().await;
    subscriptions
      .entry(execution_id.to_string())
      .or_default()
      .insert(subscriber.id, subscriber);
  }

  /// Remove one registration. Idempotent: unknown pairs are ignored. When
  /// the last subscriber of an execution leaves, the execution's entry is
  /// freed so completed executions leave nothing behind.
  pub async fn unsubscribe(&self, execution_id: &str, subscriber_id: SubscriberId) {
    let mut subscriptions = self.subscriptions.lock().await;
    if let Some(subscribers) = subscriptions.get_mut(execution_id) {
      subscribers.remove(&subscriber_id);
      if subscribers.is_empty() {
        subscriptions.remove(execution_id);
      }
    }
  }

  /// Remove a subscriber from every execution it was registered for.
  /// Called by the transport when a connection closes.
  pub async fn connection_closed(&self, subscriber_id: SubscriberId) {
    let mut subscriptions = self.subscriptions.lock().await;
    subscriptions.retain(|_, subscribers| {
      subscribers.remove(&subscriber_id);
      !subscribers.is_empty()
    });
  }

  /// Snapshot of the current subscribers of an execution.
  ///
  /// Returns owned handles so delivery happens outside the registry lock.
  pub async fn subscribers_of(&self, execution_id: &str) -> Vec<Subscriber> {
    self
      .subscriptions
      .lock()
      .await
      .get(execution_id)
      .map(|subscribers| subscribers.values().cloned().collect())
      .unwrap_or_default()
  }

  /// Number of current subscribers for an execution.
  pub async fn subscriber_count(&self, execution_id: &str) -> usize {
    self
      .subscriptions
      .lock()
      .await
      .get(execution_id)
      .map_or(0, HashMap::len)
  }
}
