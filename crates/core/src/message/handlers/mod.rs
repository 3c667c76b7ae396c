#![warn(missing_docs)]
//! This module implemented message handler of the ring.

use std::sync::Arc;

use async_trait::async_trait;

use super::MessagePayload;
use crate::dht::NodeInfo;
use crate::dht::RingState;
use crate::dispatch::Dispatch;
use crate::dispatch::Lifetime;
use crate::dispatch::Subscriber;
use crate::error::Error;
use crate::error::Result;
use crate::message::types::CorrelationKey;
use crate::message::types::LookupSend;
use crate::message::types::Message;
use crate::message::types::MessageKind;
use crate::swarm::transport::SwarmTransport;

/// Handler and subscribers for liveness checks
pub mod liveness;
/// Handler and subscribers for lookups
pub mod lookup;
/// Handler and subscribers for ring stabilization
pub mod stabilization;

/// MessageHandler will manage resources.
#[derive(Clone)]
pub struct MessageHandler {
    transport: Arc<SwarmTransport>,
    dht: Arc<RingState>,
}

/// Generic trait for handle message ,inspired by Actor-Model.
#[async_trait]
pub trait HandleMsg<T> {
    /// Message handler.
    async fn handle(&self, ctx: &MessagePayload, msg: &T) -> Result<()>;
}

impl MessageHandler {
    /// Create a new MessageHandler instance.
    pub fn new(transport: Arc<SwarmTransport>) -> Self {
        let dht = transport.dht.clone();
        Self { transport, dht }
    }

    /// Subscribe this handler permanently to every request kind it serves.
    pub fn register(&self, dispatch: &Dispatch) {
        let shared = Arc::new(self.clone());
        for kind in [
            MessageKind::Lookup,
            MessageKind::Stabilize,
            MessageKind::Predecessor,
            MessageKind::KeepAlive,
        ] {
            dispatch.subscribe(
                CorrelationKey::kind(kind),
                Lifetime::Permanent,
                shared.clone(),
            );
        }
    }

    /// Forward a lookup one hop closer to its target.
    ///
    /// Tries the closest preceding fingers from the highest slot down, then the
    /// successor. A peer that cannot be reached is dropped from the ring state before
    /// the next candidate is tried. Returns false when nobody took the message.
    pub(crate) async fn forward_lookup(&self, mut msg: LookupSend) -> Result<bool> {
        let me = self.dht.me;
        if !msg.visited.contains(&me) {
            msg.visited.push(me);
        }

        let mut failed: Vec<NodeInfo> = vec![];
        for (index, finger) in self.dht.closest_preceding_fingers(msg.target)? {
            if failed.contains(&finger) {
                continue;
            }
            if self
                .transport
                .send(&finger, Message::LookupSend(msg.clone()))
                .await
            {
                tracing::debug!("Forward lookup of {} to finger[{index}] {finger}", msg.target);
                return Ok(true);
            }
            self.dht.invalidate(&finger)?;
            failed.push(finger);
        }

        if let Some(successor) = self.dht.successor()? {
            if successor != me && !failed.contains(&successor) {
                if self
                    .transport
                    .send(&successor, Message::LookupSend(msg.clone()))
                    .await
                {
                    tracing::debug!("Forward lookup of {} to successor {successor}", msg.target);
                    return Ok(true);
                }
                self.dht.invalidate(&successor)?;
            }
        }

        Ok(false)
    }
}

#[async_trait]
impl Subscriber for MessageHandler {
    async fn notify(&self, payload: &MessagePayload) -> Result<()> {
        match &payload.message {
            Message::LookupSend(ref msg) => self.handle(payload, msg).await,
            Message::StabilizeSend(ref msg) => self.handle(payload, msg).await,
            Message::PredecessorReport(ref msg) => self.handle(payload, msg).await,
            Message::KeepAliveSend(ref msg) => self.handle(payload, msg).await,
            other => Err(Error::UnexpectedMessage(other.kind().to_string())),
        }
    }
}
