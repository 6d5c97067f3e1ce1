//! Skirmish Transport
//!
//! Websocket layer through which viewers follow executions live. Each
//! connection is one subscriber handle in the
//! [`SubscriptionRegistry`](skirmish_broadcast::SubscriptionRegistry); a
//! connection may hold subscriptions to any number of executions at once.
//!
//! Framing is one JSON object per message, discriminated by a `type`
//! field:
//!
//! - client → server: `subscribe`, `unsubscribe`, `run`
//! - server → client: `launched`, `error`, plus the broadcast events
//!   `output` and `status`
//!
//! Nothing is replayed on subscribe: a viewer that attaches mid-run reads
//! the accumulated output from the execution store (via whatever query
//! surface embeds this service) and then follows the tail here.

mod error;
mod message;
mod server;

pub use error::TransportError;
pub use message::{ClientMessage, ServerMessage};
pub use server::WsServer;
