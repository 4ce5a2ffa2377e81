//! Shared node state
//!
//! Everything the accept loop, the readers and the caller-side operations
//! share, bundled so a task can take one cheap clone.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::NodeConfig;
use crate::display::ChatDisplay;
use crate::history::{Direction, HistoryEntry, HistoryLog};
use crate::peer::{ConnectionRegistry, PeerConnection, PeerReader, PeerStreamReader};

#[derive(Clone)]
pub struct NodeContext {
    pub username: Arc<str>,
    pub registry: Arc<ConnectionRegistry>,
    pub history: Arc<Mutex<HistoryLog>>,
    pub display: Arc<dyn ChatDisplay>,
    /// Process-wide shutdown signal. Connection close signals are children.
    pub shutdown: CancellationToken,
    /// Every spawned accept loop and reader, awaited on shutdown.
    pub tasks: TaskTracker,
    /// Longest a single line may take to reach one peer.
    pub write_timeout: Duration,
    /// Longest line a reader accepts, excluding the terminator.
    pub max_line_length: usize,
}

impl NodeContext {
    pub fn new(config: &NodeConfig, display: Arc<dyn ChatDisplay>) -> Self {
        Self {
            username: Arc::from(config.username.as_str()),
            registry: Arc::new(ConnectionRegistry::new()),
            history: Arc::new(Mutex::new(HistoryLog::with_capacity(
                config.history_capacity,
            ))),
            display,
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
            write_timeout: config.write_timeout(),
            max_line_length: config.max_line_length,
        }
    }

    /// Appends one history entry.
    pub async fn record(&self, direction: Direction, text: impl Into<String>) {
        self.history
            .lock()
            .await
            .append(HistoryEntry::new(direction, text));
    }

    /// Spawns a tracked `PeerReader` for `connection`.
    pub fn spawn_reader(&self, connection: Arc<PeerConnection>, reader: PeerStreamReader) {
        let reader = PeerReader::new(connection, reader, self.clone());
        self.tasks.spawn(reader.run());
    }
}
