use log::{debug, info, warn};

use crate::display::NodeEvent;
use crate::history::Direction;
use crate::node::NodeContext;
use crate::peer::PeerAddress;
use crate::protocol::wire::format_chat;

/// What a call to [`broadcast`] did.
#[derive(Debug, PartialEq)]
pub enum SendOutcome {
    /// Blank input, nothing sent or recorded
    Ignored,
    /// Registry was empty, nothing sent or recorded
    NoPeers,
    Delivered(BroadcastReport),
}

/// Per-peer result of one broadcast.
#[derive(Debug, Default, PartialEq)]
pub struct BroadcastReport {
    pub line: String,
    pub delivered: Vec<PeerAddress>,
    pub failed: Vec<PeerAddress>,
}

/// Sends `text` as a chat line to every registered peer.
///
/// The line is recorded once as sent, then written to each peer in a
/// registry snapshot. Each write is bounded by the node's write timeout. A
/// failed or timed-out write never stops the loop: the failing connection is
/// closed, which wakes its reader to unregister it.
pub async fn broadcast(ctx: &NodeContext, text: &str) -> SendOutcome {
    if text.trim().is_empty() {
        return SendOutcome::Ignored;
    }

    let peers = ctx.registry.snapshot().await;
    if peers.is_empty() {
        info!("No peers connected to broadcast");
        return SendOutcome::NoPeers;
    }

    let line = format_chat(&ctx.username, text);
    ctx.record(Direction::Sent, line.clone()).await;
    ctx.display
        .notify(NodeEvent::MessageSent { line: line.clone() });

    let mut report = BroadcastReport {
        line,
        ..Default::default()
    };
    for peer in peers {
        match peer.send_line_within(&report.line, ctx.write_timeout).await {
            Ok(()) => report.delivered.push(peer.address().clone()),
            Err(e) => {
                warn!(
                    "Failed to send to {}: {}; closing connection",
                    peer.address(),
                    e
                );
                peer.close();
                report.failed.push(peer.address().clone());
            }
        }
    }

    debug!(
        "Broadcast delivered to {} peers, {} failed",
        report.delivered.len(),
        report.failed.len()
    );
    SendOutcome::Delivered(report)
}
