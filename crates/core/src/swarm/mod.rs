#![warn(missing_docs)]
//! A ring node: transport, dispatch, ring state and protocol wired together.

mod builder;
/// Transport callback of the node
pub mod callback;
mod state;
/// Ring level wrapper of the transport
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
pub use builder::ChordNodeBuilder;
pub use state::NodeLifecycle;
pub use state::NodeState;

use crate::config::ProtocolConfig;
use crate::dht::NodeInfo;
use crate::dht::RingId;
use crate::dht::RingState;
use crate::dht::Stabilizer;
use crate::dispatch::Dispatch;
use crate::dispatch::Lifetime;
use crate::dispatch::Subscriber;
use crate::error::Error;
use crate::error::Result;
use crate::inspect::RingInspect;
use crate::message::handlers::lookup::LookupSubscriber;
use crate::message::CorrelationKey;
use crate::message::LookupSend;
use crate::message::Message;
use crate::message::MessageHandler;
use crate::message::MessagePayload;
use crate::promise::Promise;
use crate::promise::Resolver;
use crate::swarm::transport::SwarmTransport;

/// A node of the ring.
pub struct ChordNode {
    pub(crate) dht: Arc<RingState>,
    pub(crate) transport: Arc<SwarmTransport>,
    pub(crate) dispatch: Dispatch,
    message_handler: MessageHandler,
    stabilizer: Arc<Stabilizer>,
    lifecycle: Arc<NodeLifecycle>,
    config: ProtocolConfig,
}

impl ChordNode {
    /// The local node.
    pub fn me(&self) -> NodeInfo {
        self.dht.me
    }

    /// Ring state of the node.
    pub fn dht(&self) -> Arc<RingState> {
        self.dht.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NodeState {
        self.lifecycle.get()
    }

    /// Protocol configuration of the node.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Snapshot of the ring as seen by this node.
    pub fn inspect(&self) -> RingInspect {
        RingInspect::inspect(
            &self.dht,
            self.lifecycle.get(),
            self.transport.connection_ids(),
        )
    }

    /// Start a new ring made of this node alone.
    pub fn create_ring(&self) -> Result<()> {
        if !self
            .lifecycle
            .transition(NodeState::Unjoined, NodeState::Stable)
        {
            return Err(Error::InvalidNodeState(
                self.state().to_string(),
                NodeState::Unjoined.to_string(),
            ));
        }
        let me = self.me();
        let successor = self.dht.successor()?;
        self.dht
            .compare_and_set_finger(1, successor.as_ref(), Some(me))?;
        tracing::info!("Created ring at {me}");
        self.stabilizer.start();
        Ok(())
    }

    /// Join the ring that `bootstrap` belongs to.
    ///
    /// Asks the bootstrap node who is responsible for our own id and takes the answer
    /// as successor. Fails for good if no answer arrives within the join timeout.
    pub async fn join_via(&self, bootstrap: SocketAddr) -> Result<()> {
        if !self
            .lifecycle
            .transition(NodeState::Unjoined, NodeState::Joining)
        {
            return Err(Error::InvalidNodeState(
                self.state().to_string(),
                NodeState::Unjoined.to_string(),
            ));
        }
        let me = self.me();
        let (promise, resolver) = Promise::pending();
        let subscription = self.dispatch.subscribe(
            CorrelationKey::responsible(me.id),
            Lifetime::Timeout(self.config.join_timeout()),
            Arc::new(JoinSubscriber {
                transport: self.transport.clone(),
                lifecycle: self.lifecycle.clone(),
                stabilizer: self.stabilizer.clone(),
                resolver,
            }),
        );

        let entry = NodeInfo::new(&self.dht.space, bootstrap);
        let msg = Message::LookupSend(LookupSend {
            target: me.id,
            source: me,
            visited: vec![me],
        });
        tracing::info!("Join ring via {bootstrap}");
        if !self.transport.send(&entry, msg).await {
            self.dispatch.unsubscribe(&subscription);
            self.lifecycle
                .transition(NodeState::Joining, NodeState::Failed);
            return Err(Error::BootstrapUnreachable(bootstrap.to_string()));
        }

        match promise.await {
            Some(_) => Ok(()),
            None => {
                self.lifecycle
                    .transition(NodeState::Joining, NodeState::Failed);
                tracing::error!("Failed to join via {bootstrap}");
                Err(Error::JoinTimeout(bootstrap.to_string()))
            }
        }
    }

    /// Find the node responsible for `target`.
    ///
    /// Resolves at once when this node is responsible, or to none when there is nobody
    /// to forward to. Otherwise resolves with the answer of the responsible node, or to
    /// none after the lookup timeout.
    pub fn lookup(&self, target: RingId) -> Promise<NodeInfo> {
        let me = self.me();
        match self.dht.is_responsible(target) {
            Ok(true) => return Promise::ready(Some(me)),
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Lookup of {target} failed: {e}");
                return Promise::ready(None);
            }
        }

        let (promise, resolver) = Promise::pending();
        let subscription = self.dispatch.subscribe(
            CorrelationKey::responsible(target),
            Lifetime::Timeout(self.config.lookup_timeout()),
            Arc::new(LookupSubscriber::new(resolver.clone())),
        );

        let handler = self.message_handler.clone();
        let dispatch = self.dispatch.clone();
        tokio::spawn(async move {
            let msg = LookupSend {
                target,
                source: me,
                visited: vec![],
            };
            let forwarded = match handler.forward_lookup(msg).await {
                Ok(forwarded) => forwarded,
                Err(e) => {
                    tracing::error!("Forward lookup of {target} failed: {e}");
                    false
                }
            };
            if !forwarded && dispatch.unsubscribe(&subscription) {
                tracing::warn!("No route for lookup of {target}");
                resolver.resolve(None);
            }
        });

        promise
    }

    /// Hash `key` into the ring and find the node responsible for it.
    pub fn lookup_key(&self, key: &[u8]) -> Promise<NodeInfo> {
        self.lookup(self.dht.space.hash_bytes(key))
    }

    /// Stop periodic tasks, close the transport and drop every subscription.
    pub async fn shutdown(&self) {
        self.stabilizer.stop();
        self.transport.shutdown().await;
        self.dispatch.clear();
        tracing::info!("Node {} shut down", self.me());
    }
}

/// Waits for the answer to the join lookup.
struct JoinSubscriber {
    transport: Arc<SwarmTransport>,
    lifecycle: Arc<NodeLifecycle>,
    stabilizer: Arc<Stabilizer>,
    resolver: Resolver<NodeInfo>,
}

#[async_trait]
impl Subscriber for JoinSubscriber {
    async fn notify(&self, payload: &MessagePayload) -> Result<()> {
        let successor = payload.sender;
        if !self.transport.connect(&successor).await {
            self.resolver.resolve(None);
            return Ok(());
        }

        let dht = &self.transport.dht;
        let current = dht.successor()?;
        dht.compare_and_set_finger(1, current.as_ref(), Some(successor))?;
        if self
            .lifecycle
            .transition(NodeState::Joining, NodeState::Stable)
        {
            tracing::info!("Joined ring, successor {successor}");
            self.stabilizer.start();
        }
        self.resolver.resolve(Some(successor));
        Ok(())
    }

    async fn on_timeout(&self) -> Result<()> {
        self.resolver.resolve(None);
        Ok(())
    }
}
