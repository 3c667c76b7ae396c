use async_trait::async_trait;

use crate::dht::NodeInfo;
use crate::dispatch::Subscriber;
use crate::error::Result;
use crate::message::types::LookupSend;
use crate::message::types::Message;
use crate::message::types::ResponsibleReport;
use crate::message::HandleMsg;
use crate::message::MessageHandler;
use crate::message::MessagePayload;
use crate::promise::Resolver;

#[async_trait]
impl HandleMsg<LookupSend> for MessageHandler {
    /// Answer the source directly when responsible, else forward one hop.
    async fn handle(&self, _ctx: &MessagePayload, msg: &LookupSend) -> Result<()> {
        let me = self.dht.me;
        if msg.visited.contains(&me) {
            tracing::error!(
                "Lookup of {} from {} visited {} twice, drop it",
                msg.target,
                msg.source,
                me
            );
            return Ok(());
        }

        if self.dht.is_responsible(msg.target)? {
            tracing::debug!("Responsible for {}, report to {}", msg.target, msg.source);
            self.transport
                .send_or_invalidate(
                    &msg.source,
                    Message::ResponsibleReport(ResponsibleReport { target: msg.target }),
                )
                .await;
            return Ok(());
        }

        if !self.forward_lookup(msg.clone()).await? {
            tracing::warn!(
                "Unroutable lookup of {} from {}, no finger or successor",
                msg.target,
                msg.source
            );
        }
        Ok(())
    }
}

/// Resolves a lookup promise with the responsible node, or with none on timeout.
pub struct LookupSubscriber {
    resolver: Resolver<NodeInfo>,
}

impl LookupSubscriber {
    pub fn new(resolver: Resolver<NodeInfo>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Subscriber for LookupSubscriber {
    async fn notify(&self, payload: &MessagePayload) -> Result<()> {
        self.resolver.resolve(Some(payload.sender));
        Ok(())
    }

    async fn on_timeout(&self) -> Result<()> {
        tracing::warn!("Lookup timed out");
        self.resolver.resolve(None);
        Ok(())
    }
}
