//! Console rendering
//!
//! Prints node events to stdout and formats the `/list` and `/history`
//! views. Every print re-draws the `<username>> ` prompt so incoming lines do
//! not leave the user typing on a blank line.

use chrono::{DateTime, Local};
use std::io::{self, Write};
use std::sync::Arc;

use crate::display::{ChatDisplay, NodeEvent};
use crate::history::HistoryEntry;
use crate::peer::{ConnectionStatus, PeerConnection};

pub struct ConsoleDisplay {
    username: String,
}

impl ConsoleDisplay {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }

    pub fn prompt(&self) {
        print!("{}> ", self.username);
        let _ = io::stdout().flush();
    }

    /// Prints `text` on its own line followed by a fresh prompt.
    pub fn show(&self, text: &str) {
        println!("\n{}", text);
        self.prompt();
    }
}

impl ChatDisplay for ConsoleDisplay {
    fn notify(&self, event: NodeEvent) {
        match event {
            NodeEvent::PeerConnected { address } => {
                self.show(&format!("New connection from: {}", address))
            }
            NodeEvent::MessageReceived { line, .. } => self.show(&line),
            NodeEvent::MessageSent { line } => println!("\n{}", line),
            NodeEvent::PeerDisconnected { address } => {
                self.show(&format!("Peer disconnected: {}", address))
            }
        }
    }
}

/// Startup banner listing the available commands.
pub fn format_banner(username: &str, port: u16) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();
    out.push_str(&format!("\n{rule}\nP2P CHAT SYSTEM - {username} on port {port}\n{rule}\n"));
    out.push_str("\nAvailable Commands:\n");
    out.push_str("  /connect <IP>:<PORT>    - Connect to a peer\n");
    out.push_str("  /list                   - Show all connected peers\n");
    out.push_str("  /history                - Show message history\n");
    out.push_str("  /clearhistory           - Clear message history\n");
    out.push_str("  /savehistory <file>     - Save history to file\n");
    out.push_str("  /quit                   - Exit the chat\n");
    out.push_str("\n  Type any message to broadcast to all peers\n");
    out.push_str(&"-".repeat(60));
    out
}

/// Numbered peer table with connection age and status.
pub fn format_peer_list(peers: &[Arc<PeerConnection>], now: DateTime<Local>) -> String {
    let rule = "=".repeat(50);
    let mut out = format!("{rule}\nCONNECTED PEERS LIST\n{rule}\n");

    if peers.is_empty() {
        out.push_str("No peers connected.");
        return out;
    }

    for (index, peer) in peers.iter().enumerate() {
        let elapsed = (now - peer.connected_at()).num_seconds().max(0);
        let duration = format!("{:02}:{:02}", elapsed / 60, elapsed % 60);
        let status = match peer.status() {
            ConnectionStatus::Online => "Online",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Closing | ConnectionStatus::Closed => "Offline",
        };
        out.push_str(&format!(
            "{:2}. {:<25} {:<20} {:<10}\n",
            index + 1,
            peer.address().to_string(),
            format!("Connected for {duration}"),
            status
        ));
    }
    out.push_str(&"-".repeat(50));
    out.push_str(&format!("\nTotal peers: {}", peers.len()));
    out
}

/// The `/history` view: `entries` are the shown tail, `total` the log length.
pub fn format_history(entries: &[HistoryEntry], total: usize) -> String {
    let rule = "=".repeat(70);
    let mut out = format!("{rule}\nMESSAGE HISTORY (Last {total} messages)\n{rule}\n");

    if entries.is_empty() {
        out.push_str("No messages yet. Start chatting!");
        return out;
    }

    for entry in entries {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out.push_str(&"-".repeat(70));
    out.push_str(&format!(
        "\nShowing {} of {} total messages",
        entries.len(),
        total
    ));
    out
}
