use std::sync::Arc;

use async_trait::async_trait;

use crate::dht::NodeInfo;
use crate::dht::RingState;
use crate::dispatch::Subscriber;
use crate::error::Result;
use crate::message::types::IsAliveReport;
use crate::message::types::KeepAliveSend;
use crate::message::types::Message;
use crate::message::HandleMsg;
use crate::message::MessageHandler;
use crate::message::MessagePayload;

#[async_trait]
impl HandleMsg<KeepAliveSend> for MessageHandler {
    async fn handle(&self, ctx: &MessagePayload, _msg: &KeepAliveSend) -> Result<()> {
        self.transport
            .send_or_invalidate(&ctx.sender, Message::IsAliveReport(IsAliveReport))
            .await;
        Ok(())
    }
}

/// Waits for the answer of a keep-alive sent to `predecessor`.
/// Without an answer in time the predecessor is cleared, unless it changed meanwhile.
pub struct AliveSubscriber {
    dht: Arc<RingState>,
    predecessor: NodeInfo,
}

impl AliveSubscriber {
    pub fn new(dht: Arc<RingState>, predecessor: NodeInfo) -> Self {
        Self { dht, predecessor }
    }
}

#[async_trait]
impl Subscriber for AliveSubscriber {
    async fn notify(&self, payload: &MessagePayload) -> Result<()> {
        tracing::debug!("{} is alive", payload.sender);
        Ok(())
    }

    async fn on_timeout(&self) -> Result<()> {
        if self
            .dht
            .compare_and_set_predecessor(Some(&self.predecessor), None)?
        {
            tracing::warn!("Predecessor {} failed liveness check", self.predecessor);
        }
        Ok(())
    }
}
