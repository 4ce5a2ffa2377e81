//! Command handlers
//!
//! Dispatches parsed console commands into the node and renders the text the
//! console should print.

use chrono::Local;
use log::{info, warn};
use std::path::Path;

use crate::display::console::{format_history, format_peer_list};
use crate::node::{Node, SendOutcome};
use crate::peer::PeerAddress;
use crate::protocol::commands::{Command, CommandResult, CommandStatus};

/// Runs one command against `node`.
pub async fn handle_command(node: &Node, command: Command) -> CommandResult {
    match command {
        Command::Connect(address) => handle_cmd_connect(node, address).await,
        Command::List => handle_cmd_list(node).await,
        Command::History => handle_cmd_history(node).await,
        Command::ClearHistory => handle_cmd_clear_history(node).await,
        Command::SaveHistory(file) => handle_cmd_save_history(node, &file).await,
        Command::Quit => handle_cmd_quit(node).await,
        Command::Message(text) => handle_cmd_message(node, &text).await,
    }
}

async fn handle_cmd_connect(node: &Node, address: PeerAddress) -> CommandResult {
    match node.connect_to(address).await {
        Ok(connection) => CommandResult::reply(format!("Connected to: {}", connection.address())),
        Err(e) => CommandResult::reply(e.to_string()),
    }
}

async fn handle_cmd_list(node: &Node) -> CommandResult {
    let peers = node.peers().await;
    CommandResult::reply(format_peer_list(&peers, Local::now()))
}

async fn handle_cmd_history(node: &Node) -> CommandResult {
    let shown = node.history_tail(node.config().history_display_count).await;
    let total = node.history_len().await.max(shown.len());
    CommandResult::reply(format_history(&shown, total))
}

async fn handle_cmd_clear_history(node: &Node) -> CommandResult {
    node.clear_history().await;
    info!("Message history cleared");
    CommandResult::reply("Message history cleared.")
}

async fn handle_cmd_save_history(node: &Node, file: &str) -> CommandResult {
    match node.save_history(Path::new(file)).await {
        Ok(count) => CommandResult::reply(format!(
            "History saved to: {} ({} messages)",
            file, count
        )),
        Err(e) => {
            warn!("Saving history to {} failed: {}", file, e);
            CommandResult::reply(e.to_string())
        }
    }
}

async fn handle_cmd_quit(node: &Node) -> CommandResult {
    node.shutdown().await;
    CommandResult {
        status: CommandStatus::Quit,
        message: Some("Goodbye! Shutting down...".to_string()),
    }
}

async fn handle_cmd_message(node: &Node, text: &str) -> CommandResult {
    match node.send(text).await {
        SendOutcome::Ignored => CommandResult::silent(),
        SendOutcome::NoPeers => CommandResult::reply("No peers connected to broadcast"),
        SendOutcome::Delivered(report) if report.failed.is_empty() => CommandResult::silent(),
        SendOutcome::Delivered(report) => {
            let failed: Vec<String> = report.failed.iter().map(ToString::to_string).collect();
            CommandResult::reply(format!("Could not deliver to: {}", failed.join(", ")))
        }
    }
}
