//! chordnet: Chord ring maintenance over framed TCP connections.
//! --------------
//! - [RingState](crate::dht::RingState) is the per-node view of the ring: predecessor and finger table.
//! - [Dispatch](crate::dispatch::Dispatch) correlates inbound messages with the subscriptions waiting for them.
//! - [ChordNode](crate::swarm::ChordNode) wires the transport, dispatch, ring state and protocol together.
//! - The transport itself lives in the `chordnet-transport` crate and only moves bytes.
//!
//! # Join
//!
//! A node either creates a ring, becoming its own successor, or joins through any node
//! of an existing ring:
//!
//! 1. The joining node J subscribes to the answer for its own id and sends
//!    `LookupSend { target: J, source: J }` to the bootstrap node.
//! 2. The lookup is forwarded along closest preceding fingers until it reaches the node
//!    S responsible for J, which answers J directly with a `ResponsibleReport`.
//! 3. J takes S as successor and starts its periodic tasks.
//!
//! # Stabilization
//!
//! Stabilization is push based. Every node periodically proposes itself as predecessor
//! of its successor with `StabilizeSend`. The successor adopts the proposal when it is
//! closer than its current predecessor and answers with the predecessor it ended up
//! with. If that predecessor lies between the node and its successor, it becomes the
//! new successor.
//!
//! Fix-fingers refreshes one finger per round with a lookup of the finger target, and
//! check-predecessor clears the predecessor once it stops answering keep-alives.
//!
//! # Lookup routing
//!
//! Lookups are recursive: each hop forwards to its closest preceding finger, falling back
//! to its successor, and the responsible node replies straight to the source. The hops
//! never learn the outcome.

pub mod config;
pub mod consts;
pub mod dht;
pub mod dispatch;
pub mod error;
pub mod inspect;
pub mod message;
pub mod promise;
pub mod swarm;
#[cfg(test)]
pub mod tests;

pub use chordnet_transport;
