#![warn(missing_docs)]
//! This module provider [ChordNodeBuilder] and it's interface for
//! [ChordNode]

use std::net::SocketAddr;
use std::sync::Arc;

use chordnet_transport::TcpTransport;
use chordnet_transport::TransportConfig;

use crate::config::ProtocolConfig;
use crate::dht::IdSpace;
use crate::dht::NodeInfo;
use crate::dht::RingState;
use crate::dht::Stabilizer;
use crate::dispatch::Dispatch;
use crate::error::Result;
use crate::message::MessageHandler;
use crate::swarm::callback::InnerSwarmCallback;
use crate::swarm::transport::SwarmTransport;
use crate::swarm::ChordNode;
use crate::swarm::NodeLifecycle;

/// Creates a ChordNodeBuilder to configure a ChordNode.
pub struct ChordNodeBuilder {
    bind_addr: SocketAddr,
    external_address: Option<SocketAddr>,
    config: ProtocolConfig,
    id: Option<u128>,
}

impl ChordNodeBuilder {
    /// Creates new instance of [ChordNodeBuilder] listening on `bind_addr`.
    pub fn new(bind_addr: SocketAddr) -> Self {
        ChordNodeBuilder {
            bind_addr,
            external_address: None,
            config: ProtocolConfig::default(),
            id: None,
        }
    }

    /// Sets up the endpoint announced to other nodes.
    /// Required when `bind_addr` is a wildcard address.
    pub fn external_address(mut self, external_address: SocketAddr) -> Self {
        self.external_address = Some(external_address);
        self
    }

    /// Sets up the protocol configuration.
    pub fn config(mut self, config: ProtocolConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin the id of the node instead of hashing its endpoint.
    pub fn id(mut self, id: u128) -> Self {
        self.id = Some(id);
        self
    }

    /// Bind the listener and build the node. The node starts unjoined.
    /// Failing to bind is the only fatal error of a node.
    pub async fn build(self) -> Result<ChordNode> {
        let space = IdSpace::new(self.config.ring_bits)?;
        let dispatch = Dispatch::new(self.config.worker_pool_size);

        let transport = TcpTransport::bind(
            self.bind_addr,
            self.external_address,
            TransportConfig::default().with_connect_timeout(self.config.connect_timeout()),
            Arc::new(InnerSwarmCallback::new(dispatch.clone())),
        )
        .await?;

        let endpoint = transport.advertised_addr();
        let me = match self.id {
            Some(id) => NodeInfo::with_id(space.id(id)?, endpoint),
            None => NodeInfo::new(&space, endpoint),
        };
        let dht = Arc::new(RingState::new(me, space));

        let swarm_transport = Arc::new(SwarmTransport::new(
            transport.clone(),
            dispatch.clone(),
            dht.clone(),
        ));
        let message_handler = MessageHandler::new(swarm_transport.clone());
        message_handler.register(&dispatch);

        let lifecycle = Arc::new(NodeLifecycle::default());
        let stabilizer = Arc::new(Stabilizer::new(
            swarm_transport.clone(),
            dispatch.clone(),
            message_handler.clone(),
            lifecycle.clone(),
            self.config.clone(),
        ));

        transport.listen()?;
        tracing::info!("Node {me} is listening");

        Ok(ChordNode {
            dht,
            transport: swarm_transport,
            dispatch,
            message_handler,
            stabilizer,
            lifecycle,
            config: self.config,
        })
    }
}
