//! Callback interface of the transport.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::transport::ConnectionState;

/// Error type returned by callback implementations.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// The transport holds one callback shared by every connection.
pub type SharedTransportCallback = Arc<dyn TransportCallback + Send + Sync>;

/// Any object that implements this trait can be used as a callback for a transport.
/// The `cid` passed to each method is the listening endpoint of the remote peer.
#[async_trait]
pub trait TransportCallback {
    /// This method is invoked for every upper-layer payload received on a connection.
    async fn on_message(&self, _cid: &str, _msg: &[u8]) -> Result<(), CallbackError> {
        Ok(())
    }

    /// This method is invoked when a connection is registered or released.
    async fn on_connection_state_change(
        &self,
        _cid: &str,
        _state: ConnectionState,
    ) -> Result<(), CallbackError> {
        Ok(())
    }
}
