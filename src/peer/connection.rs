//! Module `connection`
//!
//! Defines the `PeerConnection` struct: one live link to a peer, its status,
//! and the write side of its stream guarded by a per-connection lock.

use chrono::{DateTime, Local};
use log::debug;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::peer::PeerAddress;

/// Write side of a peer stream.
pub type PeerWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Read side of a peer stream, owned by its `PeerReader`.
pub type PeerStreamReader = Box<dyn AsyncRead + Send + Unpin>;

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Online,
    Closing,
    Closed,
}

impl ConnectionStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionStatus::Connecting,
            1 => ConnectionStatus::Online,
            2 => ConnectionStatus::Closing,
            _ => ConnectionStatus::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionStatus::Connecting => 0,
            ConnectionStatus::Online => 1,
            ConnectionStatus::Closing => 2,
            ConnectionStatus::Closed => 3,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Online => write!(f, "Online"),
            ConnectionStatus::Closing => write!(f, "Closing"),
            ConnectionStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// Represents one live link to a peer.
///
/// Shared as `Arc<PeerConnection>` between the registry, the peer's reader
/// task and any broadcast in flight. All writes go through [`send_line`],
/// which holds the write lock for a whole line so the hello line and
/// broadcasts never interleave on the wire.
///
/// [`send_line`]: PeerConnection::send_line
pub struct PeerConnection {
    address: PeerAddress,
    connected_at: DateTime<Local>,
    status: AtomicU8,
    writer: Mutex<PeerWriter>,
    close_signal: CancellationToken,
}

impl PeerConnection {
    /// Creates a connection in the `Connecting` state.
    ///
    /// `close_signal` is normally a child of the node's shutdown token, so a
    /// global shutdown closes every connection.
    pub fn new(address: PeerAddress, writer: PeerWriter, close_signal: CancellationToken) -> Self {
        Self {
            address,
            connected_at: Local::now(),
            status: AtomicU8::new(ConnectionStatus::Connecting.as_u8()),
            writer: Mutex::new(writer),
            close_signal,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn address(&self) -> &PeerAddress {
        &self.address
    }

    pub fn connected_at(&self) -> DateTime<Local> {
        self.connected_at
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Returns whether a close has been requested for this connection.
    pub fn is_close_requested(&self) -> bool {
        self.close_signal.is_cancelled()
    }

    // --------------------
    // State transitions
    // --------------------

    /// Moves `Connecting` to `Online`. No-op once the connection is closing.
    pub fn mark_online(&self) {
        let _ = self.status.compare_exchange(
            ConnectionStatus::Connecting.as_u8(),
            ConnectionStatus::Online.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Marks the connection closed. Called once, by the reader's cleanup.
    pub(crate) fn mark_closed(&self) {
        self.status
            .store(ConnectionStatus::Closed.as_u8(), Ordering::Release);
    }

    /// Requests the connection to close.
    ///
    /// Wakes the peer's reader, which performs the actual cleanup. Safe to
    /// call any number of times from any task.
    pub fn close(&self) {
        let _ = self.status.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            match ConnectionStatus::from_u8(current) {
                ConnectionStatus::Connecting | ConnectionStatus::Online => {
                    Some(ConnectionStatus::Closing.as_u8())
                }
                _ => None,
            }
        });
        self.close_signal.cancel();
    }

    /// Resolves once [`close`](PeerConnection::close) has been called or the
    /// parent shutdown token fired.
    pub async fn closed(&self) {
        self.close_signal.cancelled().await;
    }

    // --------------------
    // I/O
    // --------------------

    /// Writes `line` followed by a newline, holding the write lock for the
    /// whole line.
    pub async fn send_line(&self, line: &str) -> io::Result<()> {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(framed.as_bytes()).await?;
        writer.flush().await
    }

    /// Like [`send_line`](PeerConnection::send_line), but gives up after
    /// `limit`, including time spent waiting for the write lock.
    ///
    /// An elapsed limit is reported as `TimedOut`. Part of the line may
    /// already be on the wire, so the caller should close the connection.
    pub async fn send_line_within(&self, line: &str, limit: Duration) -> io::Result<()> {
        match timeout(limit, self.send_line(line)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("write to {} timed out after {:?}", self.address, limit),
            )),
        }
    }

    /// Shuts down the write side of the stream.
    ///
    /// Skipped when a write is currently holding the lock; the stream is
    /// released when the last handle to this connection drops.
    pub(crate) async fn shutdown_stream(&self) {
        match self.writer.try_lock() {
            Ok(mut writer) => {
                if let Err(e) = writer.shutdown().await {
                    debug!("Shutdown of stream to {} failed: {}", self.address, e);
                }
            }
            Err(_) => debug!(
                "Write in progress to {}, leaving stream to be dropped",
                self.address
            ),
        }
    }
}

impl fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnection")
            .field("address", &self.address)
            .field("connected_at", &self.connected_at)
            .field("status", &self.status())
            .finish()
    }
}
