#![allow(missing_docs)]
use std::net::SocketAddr;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Failed to bind listener on {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),

    #[error("Transport is already listening")]
    AlreadyListening,

    #[error("Transport listener lock poisoned")]
    ListenerLock,

    #[error("Invalid connection id {0}, expect ip:port")]
    InvalidConnectionId(String),

    #[error("Dial {0} timed out")]
    ConnectTimeout(String),

    #[error("Connection {0} not found, should connect first")]
    ConnectionNotFound(String),

    #[error("Connection {0} is closed")]
    ConnectionClosed(String),

    #[error("Connection {0} did not start with a handshake")]
    HandshakeExpected(String),
}
