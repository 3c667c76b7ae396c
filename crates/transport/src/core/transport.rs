//! Traits describing connections and the transport that owns them.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

/// Frames exchanged between two transports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransportMessage {
    /// First frame of a dialed connection. Carries the listening endpoint of the dialer,
    /// which the acceptor uses as the connection id.
    Handshake(String),
    /// Opaque payload of the upper layer.
    Custom(Bytes),
}

/// The state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Registered and usable for both directions.
    Connected,
    /// Closed after an I/O error, a replacement, or shutdown.
    Closed,
}

/// A single established connection.
#[async_trait]
pub trait ConnectionInterface {
    /// Error returned by the connection.
    type Error: std::error::Error;

    /// Write one frame to the remote peer.
    async fn send_message(&self, msg: TransportMessage) -> Result<(), Self::Error>;

    /// Current state of the connection.
    fn connection_state(&self) -> ConnectionState;

    /// Close the connection. Closing twice is a no-op.
    async fn close(&self) -> Result<(), Self::Error>;
}

/// A transport keeps one connection per remote endpoint.
#[async_trait]
pub trait TransportInterface {
    /// The connection type managed by this transport.
    type Connection: ConnectionInterface<Error = Self::Error>;
    /// Error returned by the transport.
    type Error: std::error::Error;

    /// Reuse the connection to `cid` or dial a new one.
    async fn connect(&self, cid: &str) -> Result<Arc<Self::Connection>, Self::Error>;

    /// Send an upper-layer payload to `cid`, dialing if necessary.
    /// A failed write releases the connection so the next call redials.
    async fn send(&self, cid: &str, data: Bytes) -> Result<(), Self::Error>;

    /// Close and unregister the connection to `cid`.
    async fn close_connection(&self, cid: &str) -> Result<(), Self::Error>;

    /// Get the registered connection of `cid`.
    fn connection(&self, cid: &str) -> Result<Arc<Self::Connection>, Self::Error>;

    /// All registered connections.
    fn connections(&self) -> Vec<(String, Arc<Self::Connection>)>;

    /// Ids of all registered connections.
    fn connection_ids(&self) -> Vec<String>;
}
