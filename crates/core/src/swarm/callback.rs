use async_trait::async_trait;
use chordnet_transport::core::callback::CallbackError;
use chordnet_transport::core::callback::TransportCallback;
use chordnet_transport::core::transport::ConnectionState;

use crate::dispatch::Dispatch;
use crate::message::MessagePayload;

/// [InnerSwarmCallback] decodes the payloads received by the transport and hands
/// them to [Dispatch].
pub struct InnerSwarmCallback {
    dispatch: Dispatch,
}

impl InnerSwarmCallback {
    /// Create a new [InnerSwarmCallback] publishing into `dispatch`.
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }
}

#[async_trait]
impl TransportCallback for InnerSwarmCallback {
    async fn on_message(&self, cid: &str, msg: &[u8]) -> Result<(), CallbackError> {
        let payload = match MessagePayload::from_bincode(msg) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Drop malformed payload from {cid}: {e}");
                return Ok(());
            }
        };
        tracing::debug!(
            "Received {} from {}",
            payload.message.kind(),
            payload.sender
        );
        self.dispatch.publish(payload);
        Ok(())
    }

    async fn on_connection_state_change(
        &self,
        cid: &str,
        state: ConnectionState,
    ) -> Result<(), CallbackError> {
        tracing::debug!("Connection {cid} is {state:?}");
        Ok(())
    }
}
