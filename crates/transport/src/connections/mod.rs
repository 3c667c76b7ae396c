//! Connections and transports over TCP.
//!
//! Every connection carries length-delimited frames, each frame holding one bincode encoded
//! [crate::core::transport::TransportMessage]. The first frame a dialer writes is a handshake
//! with its own listening endpoint, which both sides use as the connection id.

mod tcp;

use std::time::Duration;

pub use crate::connections::tcp::TcpConnection;
pub use crate::connections::tcp::TcpTransport;

/// Default upper bound of a single frame, 16 MiB.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;
/// Default timeout of dialing a remote endpoint.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);
/// Default time an accepted socket has to deliver its handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Tunables of a [TcpTransport].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout of dialing a remote endpoint.
    pub connect_timeout: Duration,
    /// Time an accepted socket has to deliver its handshake.
    pub handshake_timeout: Duration,
    /// Frames longer than this are rejected by the codec.
    pub max_frame_length: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }
}

impl TransportConfig {
    /// Override the dial timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}
