use std::sync::{Arc, Mutex};
use std::time::Duration;

use rax_chat::display::{ChatDisplay, NodeEvent};
use rax_chat::error::DialError;
use rax_chat::history::{Direction, read_history};
use rax_chat::node::{ListenerState, SendOutcome};
use rax_chat::peer::{ConnectionStatus, PeerAddress};
use rax_chat::{Node, NodeConfig};

// Display that records events so tests can wait on them
#[derive(Default)]
struct Events(Mutex<Vec<NodeEvent>>);

impl Events {
    fn snapshot(&self) -> Vec<NodeEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl ChatDisplay for Events {
    fn notify(&self, event: NodeEvent) {
        self.0.lock().unwrap().push(event);
    }
}

// Start a node on an ephemeral localhost port
async fn start_node(username: &str) -> (Node, Arc<Events>) {
    let events = Arc::new(Events::default());
    let config = NodeConfig {
        username: username.to_string(),
        bind_address: "127.0.0.1".to_string(),
        port: 0,
        connect_timeout_secs: 2,
        ..NodeConfig::default()
    };
    let node = Node::start(config, events.clone()).await.unwrap();
    (node, events)
}

// Poll until `node` has exactly `count` peers, for up to two seconds
async fn wait_for_peers(node: &Node, count: usize) {
    for _ in 0..200 {
        if node.registry().len().await == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {count} peers on {}", node.username());
}

// Poll until a history line of `node` ends with `suffix`
async fn wait_for_history(node: &Node, suffix: &str) {
    for _ in 0..200 {
        if node
            .export_history()
            .await
            .iter()
            .any(|line| line.ends_with(suffix))
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for '{suffix}' on {}", node.username());
}

// Nodes A and B, with B dialed into A
async fn connected_pair() -> (Node, Arc<Events>, Node, Arc<Events>) {
    let (a, a_events) = start_node("A").await;
    let (b, b_events) = start_node("B").await;

    b.connect("127.0.0.1", a.local_addr().port()).await.unwrap();
    wait_for_peers(&a, 1).await;

    (a, a_events, b, b_events)
}

#[tokio::test]
async fn test_dial_registers_both_sides() {
    let (a, _a_events, b, _b_events) = connected_pair().await;

    let b_peers = b.peers().await;
    assert_eq!(b_peers.len(), 1);
    assert_eq!(
        b_peers[0].address(),
        &PeerAddress::new("127.0.0.1", a.local_addr().port())
    );
    assert_eq!(b_peers[0].status(), ConnectionStatus::Online);

    let a_peers = a.peers().await;
    assert_eq!(a_peers.len(), 1);
    assert_eq!(a_peers[0].address().host(), "127.0.0.1");
    assert_eq!(a_peers[0].status(), ConnectionStatus::Online);

    // A saw the new connection and B's hello line
    wait_for_history(&a, "[RECV] *** B has connected ***").await;

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test]
async fn test_broadcast_reaches_peer() {
    let (a, _a_events, b, b_events) = connected_pair().await;

    let SendOutcome::Delivered(report) = a.send("hi").await else {
        panic!("A had a peer to deliver to");
    };
    assert_eq!(report.line, "[A]: hi");
    assert_eq!(report.delivered.len(), 1);

    wait_for_history(&b, "[RECV] [A]: hi").await;
    let received = b.history_tail(1).await;
    assert_eq!(received[0].text(), "[A]: hi");
    assert_eq!(received[0].direction(), Direction::Received);
    assert!(b_events.snapshot().iter().any(|e| matches!(
        e,
        NodeEvent::MessageReceived { line, .. } if line == "[A]: hi"
    )));

    let sent: Vec<_> = a
        .history_tail(100)
        .await
        .into_iter()
        .filter(|e| e.direction() == Direction::Sent)
        .collect();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text(), "[A]: hi");

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test]
async fn test_peer_close_empties_registry() {
    let (a, a_events, b, _b_events) = connected_pair().await;

    b.shutdown().await;
    assert!(b.registry().is_empty().await);
    assert_eq!(b.listener_state(), ListenerState::Stopped);

    wait_for_peers(&a, 0).await;
    assert!(
        a_events
            .snapshot()
            .iter()
            .any(|e| matches!(e, NodeEvent::PeerDisconnected { .. }))
    );

    a.shutdown().await;
}

#[tokio::test]
async fn test_saved_history_matches_log() {
    let (a, _a_events, b, _b_events) = connected_pair().await;
    a.send("hi").await;
    b.shutdown().await;
    wait_for_peers(&a, 0).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let expected = a.export_history().await;
    let written = a.save_history(&path).await.unwrap();

    assert_eq!(written, expected.len());
    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("Chat History for: A"));
    assert!(lines.next().unwrap().starts_with("Saved on: "));
    assert_eq!(read_history(&path).await.unwrap(), expected);

    a.shutdown().await;
}

#[tokio::test]
async fn test_dial_without_listener_fails_cleanly() {
    let (a, _a_events) = start_node("A").await;
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    let result = a.connect("127.0.0.1", port).await;

    assert!(matches!(
        result,
        Err(DialError::ConnectFailed(..)) | Err(DialError::Timeout(..))
    ));
    assert!(a.registry().is_empty().await);
    a.shutdown().await;
}

#[tokio::test]
async fn test_three_node_mesh_broadcast() {
    let (a, _a_events) = start_node("A").await;
    let (b, _b_events) = start_node("B").await;
    let (c, _c_events) = start_node("C").await;

    a.connect("127.0.0.1", b.local_addr().port()).await.unwrap();
    a.connect("127.0.0.1", c.local_addr().port()).await.unwrap();
    wait_for_peers(&b, 1).await;
    wait_for_peers(&c, 1).await;

    let SendOutcome::Delivered(report) = a.send("to everyone").await else {
        panic!("A had peers to deliver to");
    };
    assert_eq!(report.delivered.len(), 2);

    wait_for_history(&b, "[RECV] [A]: to everyone").await;
    wait_for_history(&c, "[RECV] [A]: to everyone").await;

    for node in [a, b, c] {
        node.shutdown().await;
    }
}
