use std::sync::Arc;

use async_trait::async_trait;

use crate::dht::NodeInfo;
use crate::dht::RingState;
use crate::dispatch::Subscriber;
use crate::error::Result;
use crate::message::types::Message;
use crate::message::types::PredecessorReport;
use crate::message::types::StabilizeSend;
use crate::message::HandleMsg;
use crate::message::MessageHandler;
use crate::message::MessagePayload;
use crate::swarm::transport::SwarmTransport;

#[async_trait]
impl HandleMsg<StabilizeSend> for MessageHandler {
    /// The sender proposes itself as our predecessor. Accept it when we have none or
    /// when it is strictly closer, then report the predecessor we ended up with.
    async fn handle(&self, ctx: &MessagePayload, _msg: &StabilizeSend) -> Result<()> {
        let me = self.dht.me;
        let candidate = ctx.sender;
        if candidate == me {
            return Ok(());
        }

        let current = self.dht.predecessor()?;
        let better = match current {
            None => true,
            Some(predecessor) => self
                .dht
                .space
                .strictly_between(predecessor.id, candidate.id, me.id),
        };
        if better && self.transport.connect(&candidate).await {
            self.dht
                .compare_and_set_predecessor(current.as_ref(), Some(candidate))?;
        }

        let predecessor = self.dht.predecessor()?;
        self.transport
            .send_or_invalidate(
                &candidate,
                Message::PredecessorReport(PredecessorReport { predecessor }),
            )
            .await;
        Ok(())
    }
}

#[async_trait]
impl HandleMsg<PredecessorReport> for MessageHandler {
    async fn handle(&self, ctx: &MessagePayload, msg: &PredecessorReport) -> Result<()> {
        let me = self.dht.me;
        let successor = ctx.sender;
        if self.dht.successor()? != Some(successor) {
            tracing::debug!("Drop stale predecessor report from {successor}");
            return Ok(());
        }
        let Some(reported) = msg.predecessor else {
            return Ok(());
        };

        if reported == me {
            // Our successor took us as predecessor; on a fresh ring it is ours as well.
            if self.dht.predecessor()?.is_none() && self.transport.connect(&successor).await {
                self.dht
                    .compare_and_set_predecessor(None, Some(successor))?;
            }
            return Ok(());
        }

        if self
            .dht
            .space
            .strictly_between(me.id, reported.id, successor.id)
        {
            if self.transport.connect(&reported).await {
                self.dht
                    .compare_and_set_finger(1, Some(&successor), Some(reported))?;
            } else {
                tracing::warn!("Keep successor {successor}, {reported} is unreachable");
            }
        }
        Ok(())
    }
}

/// Installs the answer of a fix-finger lookup into finger `index`.
pub struct FixFingerSubscriber {
    transport: Arc<SwarmTransport>,
    dht: Arc<RingState>,
    index: usize,
    expected: Option<NodeInfo>,
}

impl FixFingerSubscriber {
    /// `expected` is the content of the slot when the lookup was issued.
    pub fn new(transport: Arc<SwarmTransport>, index: usize, expected: Option<NodeInfo>) -> Self {
        let dht = transport.dht.clone();
        Self {
            transport,
            dht,
            index,
            expected,
        }
    }
}

#[async_trait]
impl Subscriber for FixFingerSubscriber {
    async fn notify(&self, payload: &MessagePayload) -> Result<()> {
        let responder = payload.sender;
        if self.expected == Some(responder) {
            return Ok(());
        }
        if !self.transport.connect(&responder).await {
            tracing::debug!("Leave finger[{}], {responder} is unreachable", self.index);
            return Ok(());
        }
        if self.dht.compare_and_set_finger(
            self.index,
            self.expected.as_ref(),
            Some(responder),
        )? {
            tracing::debug!("finger[{}] -> {responder}", self.index);
        }
        Ok(())
    }

    async fn on_timeout(&self) -> Result<()> {
        tracing::debug!("Lookup of finger[{}] timed out", self.index);
        Ok(())
    }
}
