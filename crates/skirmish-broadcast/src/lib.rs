//! Skirmish Broadcast
//!
//! Per-execution event fan-out. Viewers subscribe to an execution id and
//! receive every output line and status change published for it, in
//! publication order, until they unsubscribe or their connection dies.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Broadcaster                           │
//! │  - publish_output(execution_id, text)                       │
//! │  - publish_status(execution_id, status, output)             │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ snapshot of current subscribers
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SubscriptionRegistry                      │
//! │  execution_id ──▶ { subscriber_id ──▶ event sender }        │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ one unbounded channel each
//!                               ▼
//!                     transport connections
//! ```
//!
//! Delivery is best-effort: a subscriber whose channel has closed is
//! dropped from the registry, never retried or queued. Nothing is
//! delivered retroactively - a late subscriber reads history from the
//! execution store and then follows the live tail.

mod broadcaster;
mod event;
mod registry;

pub use broadcaster::Broadcaster;
pub use event::ExecutionEvent;
pub use registry::{Subscriber, SubscriberId, SubscriptionRegistry};
