use log::info;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::NodeConfig;
use crate::display::ChatDisplay;
use crate::error::{DialError, HistoryError, ListenError};
use crate::history::{self, HistoryEntry};
use crate::node::broadcaster::{self, SendOutcome};
use crate::node::dialer;
use crate::node::listener::{Listener, ListenerState};
use crate::node::NodeContext;
use crate::peer::{ConnectionRegistry, PeerAddress, PeerConnection};

/// A running chat node: listening socket, peer connections, history.
pub struct Node {
    ctx: NodeContext,
    config: NodeConfig,
    local_addr: SocketAddr,
    listener_state: watch::Receiver<ListenerState>,
}

impl Node {
    /// Binds the listening socket and starts accepting peers.
    ///
    /// Fails only if the socket cannot be bound.
    pub async fn start(
        config: NodeConfig,
        display: Arc<dyn ChatDisplay>,
    ) -> Result<Self, ListenError> {
        let ctx = NodeContext::new(&config, display);
        let (state_tx, listener_state) = watch::channel(ListenerState::Idle);

        let listener = Listener::bind(&config.listen_socket(), state_tx).await?;
        let local_addr = listener.local_addr();
        listener.spawn(ctx.clone());

        info!("{} is listening on port {}", config.username, local_addr.port());

        Ok(Self {
            ctx,
            config,
            local_addr,
            listener_state,
        })
    }

    pub fn username(&self) -> &str {
        &self.ctx.username
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn listener_state(&self) -> ListenerState {
        *self.listener_state.borrow()
    }

    pub fn is_running(&self) -> bool {
        !self.ctx.shutdown.is_cancelled()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.ctx.registry
    }

    // --------------------
    // Peers
    // --------------------

    /// Dials `host:port`. See [`dialer::dial`].
    pub async fn connect(&self, host: &str, port: u16) -> Result<Arc<PeerConnection>, DialError> {
        self.connect_to(PeerAddress::new(host, port)).await
    }

    pub async fn connect_to(
        &self,
        address: PeerAddress,
    ) -> Result<Arc<PeerConnection>, DialError> {
        dialer::dial(&self.ctx, address, self.config.connect_timeout()).await
    }

    pub async fn peers(&self) -> Vec<Arc<PeerConnection>> {
        self.ctx.registry.snapshot().await
    }

    /// Broadcasts `text` to every connected peer.
    pub async fn send(&self, text: &str) -> SendOutcome {
        broadcaster::broadcast(&self.ctx, text).await
    }

    // --------------------
    // History
    // --------------------

    pub async fn history_tail(&self, k: usize) -> Vec<HistoryEntry> {
        self.ctx.history.lock().await.tail(k)
    }

    pub async fn history_len(&self) -> usize {
        self.ctx.history.lock().await.len()
    }

    pub async fn clear_history(&self) {
        self.ctx.history.lock().await.clear();
    }

    pub async fn export_history(&self) -> Vec<String> {
        self.ctx.history.lock().await.export_lines()
    }

    /// Writes the current history to `path` with a header naming this node.
    pub async fn save_history(&self, path: &Path) -> Result<usize, HistoryError> {
        // Snapshot first so the lock is not held across file I/O
        let lines = self.export_history().await;
        history::save_history(path, &self.ctx.username, &lines).await
    }

    // --------------------
    // Shutdown
    // --------------------

    /// Stops accepting, closes every connection and waits for all spawned
    /// tasks to finish. Calling it again is harmless.
    pub async fn shutdown(&self) {
        info!("Shutting down node on {}", self.local_addr);
        self.ctx.shutdown.cancel();

        for connection in self.ctx.registry.snapshot().await {
            connection.close();
        }

        self.ctx.tasks.close();
        self.ctx.tasks.wait().await;
        info!("Node on {} stopped", self.local_addr);
    }
}
