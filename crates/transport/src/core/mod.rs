//! The main concepts of this mod are:
//!
//! The [ConnectionInterface](transport::ConnectionInterface) trait defines how to
//! send a framed message to a remote peer over an established connection and how
//! to tear that connection down. See the [transport] module.
//!
//! The [TransportInterface](transport::TransportInterface) trait should be
//! implemented for each Transport of Connection implementation. It owns the
//! connection pool and hides dialing behind `connect` and `send`.
//!
//! The [TransportCallback](callback::TransportCallback) trait is used to let user handle
//! the events of a connection, including connection state change and incoming
//! messages. See the [callback] module.

pub mod callback;
pub mod transport;
