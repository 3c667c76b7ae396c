//! Node identity on the ring.

use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

use crate::dht::IdSpace;
use crate::dht::RingId;

/// A node of the ring: its position and the endpoint it listens on.
/// Two values are equal iff both fields match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Position of the node on the ring.
    pub id: RingId,
    /// Listening endpoint, also the connection id used by the transport.
    pub endpoint: SocketAddr,
}

impl NodeInfo {
    /// Derive the id of `endpoint` by hashing it into `space`.
    pub fn new(space: &IdSpace, endpoint: SocketAddr) -> Self {
        Self {
            id: space.hash_endpoint(&endpoint),
            endpoint,
        }
    }

    /// Build a node with an explicit id.
    pub fn with_id(id: RingId, endpoint: SocketAddr) -> Self {
        Self { id, endpoint }
    }

    /// The connection id of this node in the transport.
    pub fn cid(&self) -> String {
        self.endpoint.to_string()
    }
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.endpoint)
    }
}
