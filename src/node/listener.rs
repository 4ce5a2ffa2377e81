use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::display::NodeEvent;
use crate::error::ListenError;
use crate::history::Direction;
use crate::node::NodeContext;
use crate::peer::{PeerAddress, PeerConnection};

/// Lifecycle of the listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Bound,
    Accepting,
    Stopped,
}

/// Owns the listening socket and runs the accept loop.
pub struct Listener {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: watch::Sender<ListenerState>,
}

impl Listener {
    /// Binds `addr`. A failure here is fatal for the node.
    pub async fn bind(
        addr: &str,
        state: watch::Sender<ListenerState>,
    ) -> Result<Self, ListenError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ListenError::BindFailed(addr.to_string(), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ListenError::BindFailed(addr.to_string(), e))?;

        info!("Listening on {}", local_addr);
        state.send_replace(ListenerState::Bound);

        Ok(Self {
            listener,
            local_addr,
            state,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts the accept loop on a tracked task.
    pub fn spawn(self, ctx: NodeContext) {
        let tasks = ctx.tasks.clone();
        tasks.spawn(self.run(ctx));
    }

    async fn run(self, ctx: NodeContext) {
        self.state.send_replace(ListenerState::Accepting);

        loop {
            tokio::select! {
                _ = ctx.shutdown.cancelled() => break,
                result = self.listener.accept() => match result {
                    Ok((stream, addr)) => accept_peer(stream, addr, &ctx).await,
                    Err(e) => error!("Error accepting connection: {}", e),
                },
            }
        }

        // Dropping the socket stops the OS from queueing further peers
        drop(self.listener);
        self.state.send_replace(ListenerState::Stopped);
        info!("Stopped listening on {}", self.local_addr);
    }
}

/// Registers an inbound peer and starts its reader.
async fn accept_peer(stream: TcpStream, remote: SocketAddr, ctx: &NodeContext) {
    let address = PeerAddress::from(remote);
    let (read_half, write_half) = stream.into_split();
    let connection = Arc::new(PeerConnection::new(
        address.clone(),
        Box::new(write_half),
        ctx.shutdown.child_token(),
    ));

    if let Err(e) = ctx
        .registry
        .register(address.clone(), connection.clone())
        .await
    {
        // Both halves drop here, closing the new socket
        warn!("{}; closing new connection", e);
        return;
    }
    connection.mark_online();

    info!("New connection from {}", address);
    ctx.record(Direction::Received, format!("New connection from {}", address))
        .await;
    ctx.display.notify(NodeEvent::PeerConnected {
        address: address.clone(),
    });
    ctx.spawn_reader(connection, Box::new(read_half));
}
