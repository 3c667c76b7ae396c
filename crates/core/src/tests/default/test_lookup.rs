use std::time::Duration;

use tokio::net::TcpListener;

use crate::dht::NodeInfo;
use crate::error::Error;
use crate::swarm::ChordNode;
use crate::swarm::NodeState;
use crate::tests::default::dead_endpoint;
use crate::tests::default::fast_config;
use crate::tests::default::prepare_node;
use crate::tests::default::prepare_node_with_config;
use crate::tests::default::successor_of;
use crate::tests::default::wait_until;

/// Accepts connections and never answers.
async fn silent_peer() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = vec![];
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

fn node_at(node: &ChordNode, id: u128, endpoint: std::net::SocketAddr) -> NodeInfo {
    NodeInfo::with_id(node.dht().space.id(id).unwrap(), endpoint)
}

#[tokio::test]
async fn test_single_node_owns_everything() {
    let node = prepare_node(10).await;
    node.create_ring().unwrap();

    for target in [0u128, 10, 11, 200, 255] {
        let id = node.dht().space.id(target).unwrap();
        assert_eq!(node.lookup(id).await, Some(node.me()));
    }
    assert_eq!(node.lookup_key(b"some key").await, Some(node.me()));
    node.shutdown().await;
}

#[tokio::test]
async fn test_lookup_three_nodes() {
    let node1 = prepare_node(10).await;
    let node2 = prepare_node(90).await;
    let node3 = prepare_node(160).await;
    node1.create_ring().unwrap();
    node2.join_via(node1.me().endpoint).await.unwrap();
    node3.join_via(node1.me().endpoint).await.unwrap();

    wait_until(Duration::from_secs(10), "three node ring", || {
        successor_of(&node1) == Some(node2.me())
            && successor_of(&node2) == Some(node3.me())
            && successor_of(&node3) == Some(node1.me())
            && node1.dht().predecessor().unwrap() == Some(node3.me())
            && node2.dht().predecessor().unwrap() == Some(node1.me())
            && node3.dht().predecessor().unwrap() == Some(node2.me())
    })
    .await;

    let space = node1.dht().space;
    assert_eq!(node1.lookup(space.id(100).unwrap()).await, Some(node3.me()));
    assert_eq!(node1.lookup(space.id(50).unwrap()).await, Some(node2.me()));
    assert_eq!(node1.lookup(space.id(90).unwrap()).await, Some(node2.me()));
    assert_eq!(node1.lookup(space.id(5).unwrap()).await, Some(node1.me()));
    assert_eq!(node2.lookup(space.id(200).unwrap()).await, Some(node1.me()));
    assert_eq!(node3.lookup(space.id(161).unwrap()).await, Some(node1.me()));

    node1.shutdown().await;
    node2.shutdown().await;
    node3.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_finger_is_invalidated() {
    let node = prepare_node(10).await;
    let dead = node_at(&node, 50, dead_endpoint());
    assert!(node
        .dht()
        .compare_and_set_finger(1, None, Some(dead))
        .unwrap());

    let target = node.dht().space.id(100).unwrap();
    assert_eq!(node.lookup(target).await, None);
    assert_eq!(successor_of(&node), None);
    node.shutdown().await;
}

#[tokio::test]
async fn test_lookup_timeout() {
    let mut config = fast_config();
    config.lookup_timeout = 300;
    let node = prepare_node_with_config(10, config).await;
    let silent = node_at(&node, 50, silent_peer().await);
    node.dht()
        .compare_and_set_finger(1, None, Some(silent))
        .unwrap();

    let target = node.dht().space.id(100).unwrap();
    assert_eq!(node.lookup(target).await, None);
    // Delivered but unanswered, the finger stays.
    assert_eq!(successor_of(&node), Some(silent));
    node.shutdown().await;
}

#[tokio::test]
async fn test_join_unreachable_bootstrap() {
    let node = prepare_node(10).await;
    let bootstrap = dead_endpoint();
    assert!(matches!(
        node.join_via(bootstrap).await,
        Err(Error::BootstrapUnreachable(_))
    ));
    assert_eq!(node.state(), NodeState::Failed);
    assert!(matches!(
        node.join_via(bootstrap).await,
        Err(Error::InvalidNodeState(_, _))
    ));
    node.shutdown().await;
}

#[tokio::test]
async fn test_join_timeout() {
    let mut config = fast_config();
    config.join_timeout = 300;
    let node = prepare_node_with_config(10, config).await;
    let bootstrap = silent_peer().await;
    assert!(matches!(
        node.join_via(bootstrap).await,
        Err(Error::JoinTimeout(_))
    ));
    assert_eq!(node.state(), NodeState::Failed);
    assert_eq!(successor_of(&node), None);
    node.shutdown().await;
}
