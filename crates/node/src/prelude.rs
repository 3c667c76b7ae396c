//! Re-exports used by the binary.
pub use chordnet_core;
pub use chordnet_core::config::ProtocolConfig;
pub use chordnet_core::dht::NodeInfo;
pub use chordnet_core::dht::RingId;
pub use chordnet_core::swarm::ChordNode;
pub use chordnet_core::swarm::ChordNodeBuilder;
