use std::sync::Arc;

use chordnet_transport::core::transport::TransportInterface;
use chordnet_transport::TcpTransport;

use crate::dht::NodeInfo;
use crate::dht::RingState;
use crate::dispatch::Dispatch;
use crate::message::Message;
use crate::message::MessagePayload;

/// Ring level view of the transport: peers are [NodeInfo] and every failure is a
/// boolean, the caller decides which ring pointers to drop.
pub struct SwarmTransport {
    transport: TcpTransport,
    dispatch: Dispatch,
    pub(crate) dht: Arc<RingState>,
}

impl SwarmTransport {
    pub fn new(transport: TcpTransport, dispatch: Dispatch, dht: Arc<RingState>) -> Self {
        Self {
            transport,
            dispatch,
            dht,
        }
    }

    /// Wrap `message` with the local node as sender and deliver it to `target`.
    /// Messages addressed to the local node never touch the network.
    pub async fn send(&self, target: &NodeInfo, message: Message) -> bool {
        let kind = message.kind();
        let payload = MessagePayload::new(self.dht.me, message);
        if *target == self.dht.me {
            self.dispatch.publish(payload);
            return true;
        }

        let data = match payload.to_bincode() {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Failed to encode {kind}: {e}");
                return false;
            }
        };
        match self.transport.send(&target.cid(), data).await {
            Ok(()) => {
                tracing::debug!("Sent {kind} to {target}");
                true
            }
            Err(e) => {
                tracing::warn!("Failed to send {kind} to {target}: {e}");
                false
            }
        }
    }

    /// [SwarmTransport::send], dropping every ring pointer to `target` on failure.
    pub async fn send_or_invalidate(&self, target: &NodeInfo, message: Message) -> bool {
        if self.send(target, message).await {
            return true;
        }
        if let Err(e) = self.dht.invalidate(target) {
            tracing::error!("Failed to invalidate {target}: {e}");
        }
        false
    }

    /// Make sure a connection to `target` is open, dialing if needed.
    pub async fn connect(&self, target: &NodeInfo) -> bool {
        if *target == self.dht.me {
            return true;
        }
        match self.transport.connect(&target.cid()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to connect {target}: {e}");
                false
            }
        }
    }

    /// Ids of all open connections.
    pub fn connection_ids(&self) -> Vec<String> {
        self.transport.connection_ids()
    }

    /// Stop the transport and close every connection.
    pub async fn shutdown(&self) {
        self.transport.shutdown().await
    }
}
