use log::{debug, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::display::NodeEvent;
use crate::history::Direction;
use crate::node::NodeContext;
use crate::peer::{PeerConnection, PeerStreamReader};
use crate::protocol::wire::{WireLine, classify, decode_line};

/// Per-connection read loop.
///
/// - Reads newline-delimited lines until EOF, an I/O error, or the
///   connection's close signal (which global shutdown also fires).
/// - Drops the connection when a line exceeds the node's `max_line_length`.
/// - Records every line as a received history entry and forwards it to the
///   display.
/// - Always finishes with a single cleanup: unregister, close the stream,
///   tell the display the peer is gone.
pub struct PeerReader {
    connection: Arc<PeerConnection>,
    reader: BufReader<PeerStreamReader>,
    ctx: NodeContext,
}

impl PeerReader {
    pub fn new(connection: Arc<PeerConnection>, reader: PeerStreamReader, ctx: NodeContext) -> Self {
        Self {
            connection,
            reader: BufReader::new(reader),
            ctx,
        }
    }

    pub async fn run(mut self) {
        let address = self.connection.address().clone();
        debug!("Reader started for {}", address);
        let max_line_length = self.ctx.max_line_length;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            // Room for the longest line plus its `\n`
            let mut limited = (&mut self.reader).take(max_line_length as u64 + 1);
            let read = tokio::select! {
                _ = self.connection.closed() => {
                    debug!("Close requested for {}", address);
                    break;
                }
                result = limited.read_until(b'\n', &mut buf) => result,
            };

            match read {
                Ok(0) => {
                    info!("Connection closed by peer {}", address);
                    break;
                }
                Ok(_) if buf.len() > max_line_length && buf.last() != Some(&b'\n') => {
                    warn!(
                        "Line from {} exceeds {} bytes; dropping connection",
                        address, max_line_length
                    );
                    break;
                }
                Ok(_) => {
                    let line = decode_line(&buf);
                    match classify(&line) {
                        WireLine::Hello { username } => {
                            info!("{} introduced itself as {}", address, username)
                        }
                        WireLine::Chat { .. } | WireLine::Other(_) => {
                            debug!("Received from {}: {}", address, line)
                        }
                    }

                    self.ctx.record(Direction::Received, line.clone()).await;
                    self.ctx.display.notify(NodeEvent::MessageReceived {
                        from: address.clone(),
                        line,
                    });
                }
                Err(e) => {
                    warn!("Failed to read from {}: {}", address, e);
                    break;
                }
            }
        }

        self.cleanup().await;
    }

    async fn cleanup(self) {
        let address = self.connection.address().clone();

        self.ctx.registry.unregister(&address).await;
        self.connection.close();
        self.connection.shutdown_stream().await;
        self.connection.mark_closed();

        info!("Peer {} disconnected", address);
        self.ctx
            .display
            .notify(NodeEvent::PeerDisconnected { address });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::context::tests::{RecordingDisplay, test_context};
    use crate::peer::{ConnectionStatus, PeerAddress};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Registers a connection backed by in-memory pipes and spawns its reader.
    /// Returns the far end: what the peer writes and where it reads from.
    async fn spawn_peer(
        ctx: &NodeContext,
        address: &PeerAddress,
    ) -> (Arc<PeerConnection>, tokio::io::DuplexStream, tokio::io::DuplexStream) {
        let (inbound_local, inbound_remote) = tokio::io::duplex(1024);
        let (outbound_local, outbound_remote) = tokio::io::duplex(1024);
        let connection = Arc::new(PeerConnection::new(
            address.clone(),
            Box::new(outbound_local),
            ctx.shutdown.child_token(),
        ));
        ctx.registry
            .register(address.clone(), connection.clone())
            .await
            .unwrap();
        connection.mark_online();
        ctx.spawn_reader(connection.clone(), Box::new(inbound_local));
        (connection, inbound_remote, outbound_remote)
    }

    #[tokio::test]
    async fn test_lines_recorded_in_arrival_order() {
        let display = RecordingDisplay::new();
        let ctx = test_context("alice", display.clone());
        let address = PeerAddress::new("10.0.0.2", 4100);
        let (connection, mut peer_tx, _peer_rx) = spawn_peer(&ctx, &address).await;

        peer_tx
            .write_all(b"*** bob has connected ***\n[bob]: one\r\n[bob]: two\n")
            .await
            .unwrap();
        drop(peer_tx);

        ctx.tasks.close();
        ctx.tasks.wait().await;

        let history = ctx.history.lock().await;
        let texts: Vec<&str> = history.iter().map(|e| e.text()).collect();
        assert_eq!(
            texts,
            vec!["*** bob has connected ***", "[bob]: one", "[bob]: two"]
        );
        assert!(history.iter().all(|e| e.direction() == Direction::Received));

        assert!(ctx.registry.is_empty().await);
        assert_eq!(connection.status(), ConnectionStatus::Closed);
        assert_eq!(
            display.events().last(),
            Some(&NodeEvent::PeerDisconnected { address })
        );
    }

    #[tokio::test]
    async fn test_partial_last_line_is_kept() {
        let ctx = test_context("alice", RecordingDisplay::new());
        let address = PeerAddress::new("10.0.0.2", 4101);
        let (_connection, mut peer_tx, _peer_rx) = spawn_peer(&ctx, &address).await;

        peer_tx.write_all(b"no newline").await.unwrap();
        drop(peer_tx);
        ctx.tasks.close();
        ctx.tasks.wait().await;

        let history = ctx.history.lock().await;
        assert_eq!(history.tail(1)[0].text(), "no newline");
    }

    #[tokio::test]
    async fn test_close_unblocks_reader_and_cleans_up_once() {
        let display = RecordingDisplay::new();
        let ctx = test_context("alice", display.clone());
        let address = PeerAddress::new("10.0.0.3", 4200);
        let (connection, _peer_tx, mut peer_rx) = spawn_peer(&ctx, &address).await;

        connection.close();
        connection.close();
        ctx.tasks.close();
        ctx.tasks.wait().await;

        assert!(ctx.registry.is_empty().await);
        let disconnects = display
            .events()
            .iter()
            .filter(|e| matches!(e, NodeEvent::PeerDisconnected { .. }))
            .count();
        assert_eq!(disconnects, 1);

        // Write side was shut down, so the peer sees EOF
        let mut rest = Vec::new();
        peer_rx.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_every_reader() {
        let ctx = test_context("alice", RecordingDisplay::new());
        let mut far_ends = Vec::new();
        for port in 4300..4304 {
            far_ends.push(spawn_peer(&ctx, &PeerAddress::new("10.0.0.4", port)).await);
        }

        ctx.shutdown.cancel();
        ctx.tasks.close();
        ctx.tasks.wait().await;

        assert!(ctx.registry.is_empty().await);
        for (connection, _, _) in &far_ends {
            assert_eq!(connection.status(), ConnectionStatus::Closed);
        }
    }

    #[tokio::test]
    async fn test_overlong_line_drops_connection() {
        let mut ctx = test_context("alice", RecordingDisplay::new());
        ctx.max_line_length = 32;
        let address = PeerAddress::new("10.0.0.5", 4400);
        let (connection, mut peer_tx, _peer_rx) = spawn_peer(&ctx, &address).await;

        // A line of exactly the limit is fine; the next one never ends
        let mut data = "x".repeat(32).into_bytes();
        data.push(b'\n');
        data.extend_from_slice(&[b'y'; 100]);
        peer_tx.write_all(&data).await.unwrap();

        ctx.tasks.close();
        tokio::time::timeout(std::time::Duration::from_secs(3), ctx.tasks.wait())
            .await
            .expect("reader should stop on an overlong line");

        let history = ctx.history.lock().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history.tail(1)[0].text(), "x".repeat(32));
        assert!(ctx.registry.is_empty().await);
        assert_eq!(connection.status(), ConnectionStatus::Closed);
        drop(peer_tx);
    }
}
