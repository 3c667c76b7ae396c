use std::time::Duration;

use crate::error::Error;
use crate::swarm::NodeState;
use crate::tests::default::predecessor_of;
use crate::tests::default::prepare_node;
use crate::tests::default::successor_of;
use crate::tests::default::wait_until;

const CONVERGE: Duration = Duration::from_secs(10);

#[tokio::test]
async fn test_create_ring() {
    let node = prepare_node(10).await;
    assert_eq!(node.state(), NodeState::Unjoined);
    assert_eq!(successor_of(&node), None);

    node.create_ring().unwrap();
    assert_eq!(node.state(), NodeState::Stable);
    assert_eq!(successor_of(&node), Some(node.me()));
    assert_eq!(predecessor_of(&node), None);

    // Only an unjoined node may create or join.
    assert!(matches!(
        node.create_ring(),
        Err(Error::InvalidNodeState(_, _))
    ));
    node.shutdown().await;
}

#[tokio::test]
async fn test_two_nodes_converge() {
    let node1 = prepare_node(10).await;
    let node2 = prepare_node(90).await;
    node1.create_ring().unwrap();
    node2.join_via(node1.me().endpoint).await.unwrap();
    assert_eq!(node2.state(), NodeState::Stable);
    assert_eq!(successor_of(&node2), Some(node1.me()));

    wait_until(CONVERGE, "two node ring", || {
        successor_of(&node1) == Some(node2.me())
            && predecessor_of(&node1) == Some(node2.me())
            && successor_of(&node2) == Some(node1.me())
            && predecessor_of(&node2) == Some(node1.me())
    })
    .await;

    let inspect = node1.inspect();
    assert_eq!(inspect.successor, Some(node2.me().to_string()));
    assert!(inspect
        .connections
        .contains(&node2.me().endpoint.to_string()));

    node1.shutdown().await;
    node2.shutdown().await;
}

#[tokio::test]
async fn test_three_nodes_converge() {
    let node1 = prepare_node(10).await;
    let node2 = prepare_node(90).await;
    let node3 = prepare_node(160).await;
    node1.create_ring().unwrap();
    node2.join_via(node1.me().endpoint).await.unwrap();
    node3.join_via(node1.me().endpoint).await.unwrap();

    wait_until(CONVERGE, "three node ring", || {
        successor_of(&node1) == Some(node2.me())
            && successor_of(&node2) == Some(node3.me())
            && successor_of(&node3) == Some(node1.me())
            && predecessor_of(&node1) == Some(node3.me())
            && predecessor_of(&node2) == Some(node1.me())
            && predecessor_of(&node3) == Some(node2.me())
    })
    .await;

    // Fingers of 10 target 11, 12, 14, 18, 26, 42, 74 and 138.
    wait_until(CONVERGE, "fingers of node 10", || {
        let fingers = node1.dht().fingers().unwrap();
        fingers[..7].iter().all(|f| *f == Some(node2.me())) && fingers[7] == Some(node3.me())
    })
    .await;

    node1.shutdown().await;
    node2.shutdown().await;
    node3.shutdown().await;
}

#[tokio::test]
async fn test_predecessor_failure_detected() {
    let node1 = prepare_node(10).await;
    let node2 = prepare_node(90).await;
    node1.create_ring().unwrap();
    node2.join_via(node1.me().endpoint).await.unwrap();

    wait_until(CONVERGE, "two node ring", || {
        predecessor_of(&node1) == Some(node2.me()) && successor_of(&node1) == Some(node2.me())
    })
    .await;

    node2.shutdown().await;

    wait_until(CONVERGE, "node 90 forgotten", || {
        predecessor_of(&node1).is_none()
            && node1
                .dht()
                .fingers()
                .unwrap()
                .iter()
                .all(|f| *f != Some(node2.me()))
    })
    .await;
    node1.shutdown().await;
}

#[tokio::test]
async fn test_lone_survivor_owns_the_ring() {
    let node1 = prepare_node(10).await;
    let node2 = prepare_node(90).await;
    node1.create_ring().unwrap();
    node2.join_via(node1.me().endpoint).await.unwrap();

    wait_until(CONVERGE, "two node ring", || {
        predecessor_of(&node1) == Some(node2.me()) && successor_of(&node1) == Some(node2.me())
    })
    .await;

    node2.shutdown().await;

    wait_until(CONVERGE, "node 10 alone", || {
        predecessor_of(&node1).is_none() && successor_of(&node1) == Some(node1.me())
    })
    .await;
    let target = node1.dht().space.id(200).unwrap();
    assert_eq!(node1.lookup(target).await, Some(node1.me()));

    // The survivor takes newcomers again.
    let node3 = prepare_node(50).await;
    node3.join_via(node1.me().endpoint).await.unwrap();
    assert_eq!(successor_of(&node3), Some(node1.me()));
    wait_until(CONVERGE, "ring of 10 and 50", || {
        successor_of(&node1) == Some(node3.me()) && predecessor_of(&node1) == Some(node3.me())
    })
    .await;

    node1.shutdown().await;
    node3.shutdown().await;
}
