use std::sync::Arc;
use std::time::Duration;

use crate::dht::NodeInfo;
use crate::dispatch::Lifetime;
use crate::dispatch::Subscriber;
use crate::message::handlers::lookup::LookupSubscriber;
use crate::message::handlers::stabilization::FixFingerSubscriber;
use crate::message::CorrelationKey;
use crate::message::LookupSend;
use crate::message::Message;
use crate::message::MessagePayload;
use crate::message::PredecessorReport;
use crate::message::ResponsibleReport;
use crate::message::StabilizeSend;
use crate::promise::Promise;
use crate::swarm::ChordNode;
use crate::tests::default::dead_endpoint;
use crate::tests::default::predecessor_of;
use crate::tests::default::prepare_node;
use crate::tests::default::successor_of;
use crate::tests::default::wait_until;

const SETTLE: Duration = Duration::from_millis(300);
const CONVERGE: Duration = Duration::from_secs(5);

fn node_at(node: &ChordNode, id: u128, endpoint: std::net::SocketAddr) -> NodeInfo {
    NodeInfo::with_id(node.dht().space.id(id).unwrap(), endpoint)
}

#[tokio::test]
async fn test_stabilize_keeps_closer_predecessor() {
    let node10 = prepare_node(10).await;
    let node90 = prepare_node(90).await;
    let node160 = prepare_node(160).await;

    // 90 is not on the arc (160, 10), so 160 stays.
    assert!(node10
        .dht()
        .compare_and_set_predecessor(None, Some(node160.me()))
        .unwrap());
    // 90 applies the report of 10 only if 10 is its successor.
    assert!(node90
        .dht()
        .compare_and_set_finger(1, None, Some(node10.me()))
        .unwrap());

    assert!(
        node90
            .transport
            .send(&node10.me(), Message::StabilizeSend(StabilizeSend))
            .await
    );

    // The report of 10 names 160, which lies on (90, 10) and becomes the successor of 90.
    wait_until(CONVERGE, "report of node 10", || {
        successor_of(&node90) == Some(node160.me())
    })
    .await;
    assert_eq!(predecessor_of(&node10), Some(node160.me()));
}

#[tokio::test]
async fn test_predecessor_report_from_stranger_is_dropped() {
    let node10 = prepare_node(10).await;
    let node50 = prepare_node(50).await;
    let node90 = prepare_node(90).await;
    let node160 = prepare_node(160).await;

    assert!(node10
        .dht()
        .compare_and_set_finger(1, None, Some(node160.me()))
        .unwrap());

    let report = Message::PredecessorReport(PredecessorReport {
        predecessor: Some(node50.me()),
    });
    assert!(node90.transport.send(&node10.me(), report.clone()).await);
    tokio::time::sleep(SETTLE).await;
    assert_eq!(successor_of(&node10), Some(node160.me()));

    // The same report from the successor is applied.
    assert!(node160.transport.send(&node10.me(), report).await);
    wait_until(CONVERGE, "successor 50", || {
        successor_of(&node10) == Some(node50.me())
    })
    .await;
}

#[tokio::test]
async fn test_lookup_visiting_a_node_twice_is_dropped() {
    let node10 = prepare_node(10).await;
    let node90 = prepare_node(90).await;
    node10.create_ring().unwrap();

    let target = node10.dht().space.id(200).unwrap();
    let await_report = || {
        let (promise, resolver) = Promise::pending();
        node90.dispatch.subscribe(
            CorrelationKey::responsible(target),
            Lifetime::Timeout(Duration::from_millis(500)),
            Arc::new(LookupSubscriber::new(resolver)),
        );
        promise
    };

    // 10 owns the whole ring, but already saw this lookup.
    let report = await_report();
    let looped = Message::LookupSend(LookupSend {
        target,
        source: node90.me(),
        visited: vec![node90.me(), node10.me()],
    });
    assert!(node90.transport.send(&node10.me(), looped).await);
    assert_eq!(report.await, None);

    let report = await_report();
    let fresh = Message::LookupSend(LookupSend {
        target,
        source: node90.me(),
        visited: vec![node90.me()],
    });
    assert!(node90.transport.send(&node10.me(), fresh).await);
    assert_eq!(report.await, Some(node10.me()));

    node10.shutdown().await;
}

#[tokio::test]
async fn test_fix_finger_ignores_unreachable_responder() {
    let node10 = prepare_node(10).await;
    let node90 = prepare_node(90).await;
    let stale = node_at(&node10, 30, dead_endpoint());
    assert!(node10
        .dht()
        .compare_and_set_finger(3, None, Some(stale))
        .unwrap());

    let target = node10.dht().space.id(14).unwrap();
    let answer = |sender: NodeInfo| {
        MessagePayload::new(
            sender,
            Message::ResponsibleReport(ResponsibleReport { target }),
        )
    };

    let gone = node_at(&node10, 20, dead_endpoint());
    FixFingerSubscriber::new(node10.transport.clone(), 3, Some(stale))
        .notify(&answer(gone))
        .await
        .unwrap();
    assert_eq!(node10.dht().finger(3).unwrap(), Some(stale));

    FixFingerSubscriber::new(node10.transport.clone(), 3, Some(stale))
        .notify(&answer(node90.me()))
        .await
        .unwrap();
    assert_eq!(node10.dht().finger(3).unwrap(), Some(node90.me()));
}
