//! Error of chordnet_core

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in chordnet-core.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] chordnet_transport::error::Error),

    #[error("Bincode serialization error")]
    BincodeSerialize(#[source] bincode::Error),

    #[error("Bincode deserialization error")]
    BincodeDeserialize(#[source] bincode::Error),

    #[error("JSON serialization error")]
    Serialize(#[source] serde_json::Error),

    #[error("Ring bits should be in 1..=128, got {0}")]
    InvalidRingBits(u32),

    #[error("Finger index {0} out of range 1..={1}")]
    FingerIndexOutOfRange(usize, u32),

    #[error("Id {0} does not fit into a ring of {1} bits")]
    IdOutOfRange(u128, u32),

    #[error("Failed to acquire lock of ring state")]
    RingStateLockError,

    #[error("Node state is {0}, expect {1}")]
    InvalidNodeState(String, String),

    #[error("Bootstrap node {0} is unreachable")]
    BootstrapUnreachable(String),

    #[error("Join via {0} timed out")]
    JoinTimeout(String),

    #[error("Unexpected message {0} for this handler")]
    UnexpectedMessage(String),
}
