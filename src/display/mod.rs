//! Display collaborator
//!
//! The node never prints. It reports what happens through [`ChatDisplay`],
//! and the binary plugs in a [`ConsoleDisplay`].

pub mod console;

pub use console::ConsoleDisplay;

use crate::peer::PeerAddress;

/// Something the user should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    PeerConnected { address: PeerAddress },
    MessageReceived { from: PeerAddress, line: String },
    MessageSent { line: String },
    PeerDisconnected { address: PeerAddress },
}

/// Receives node events. Called from any task, possibly concurrently.
pub trait ChatDisplay: Send + Sync {
    fn notify(&self, event: NodeEvent);
}
