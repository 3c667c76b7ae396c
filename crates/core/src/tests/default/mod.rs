use std::net::SocketAddr;
use std::time::Duration;

use crate::config::ProtocolConfig;
use crate::dht::NodeInfo;
use crate::swarm::ChordNode;
use crate::swarm::ChordNodeBuilder;

mod test_handlers;
mod test_lookup;
mod test_stabilization;

pub fn fast_config() -> ProtocolConfig {
    ProtocolConfig {
        ring_bits: 8,
        stabilize_interval: 50,
        fix_fingers_interval: 50,
        check_predecessor_interval: 100,
        dump_interval: None,
        lookup_timeout: 2000,
        join_timeout: 2000,
        liveness_timeout: 300,
        connect_timeout: 500,
        worker_pool_size: 16,
    }
}

pub async fn prepare_node(id: u128) -> ChordNode {
    prepare_node_with_config(id, fast_config()).await
}

pub async fn prepare_node_with_config(id: u128, config: ProtocolConfig) -> ChordNode {
    let node = ChordNodeBuilder::new("127.0.0.1:0".parse().unwrap())
        .config(config)
        .id(id)
        .build()
        .await
        .unwrap();
    println!("node: {}", node.me());
    node
}

/// An address nobody listens on.
pub fn dead_endpoint() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Poll `check` until it holds, panics after `timeout`.
pub async fn wait_until<F>(timeout: Duration, what: &str, check: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub fn successor_of(node: &ChordNode) -> Option<NodeInfo> {
    node.dht().successor().unwrap()
}

pub fn predecessor_of(node: &ChordNode) -> Option<NodeInfo> {
    node.dht().predecessor().unwrap()
}
