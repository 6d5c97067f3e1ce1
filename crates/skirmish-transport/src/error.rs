//! Transport errors.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while running the websocket transport.
#[derive(Debug, Error)]
pub enum TransportError {
  /// The listener socket could not be bound.
  #[error("failed to bind websocket listener on {addr}: {source}")]
  Bind {
    addr: SocketAddr,
    #[source]
    source: std::io::Error,
  },

  /// The bound listener's local address could not be read back.
  #[error("failed to resolve listener address: {source}")]
  LocalAddr {
    #[source]
    source: std::io::Error,
  },
}
