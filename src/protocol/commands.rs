//! Module `commands`
//!
//! Defines the console commands a user can type and the result of running
//! one.

use crate::peer::PeerAddress;

/// Represents one line of user input.
///
/// Anything that is not a recognised command is a chat message to broadcast.
#[derive(Debug, PartialEq)]
pub enum Command {
    Connect(PeerAddress), // Dial a peer
    List,                 // Show connected peers
    History,              // Show recent history
    ClearHistory,         // Empty the history log
    SaveHistory(String),  // Export history to a file
    Quit,                 // Shut the node down
    Message(String),      // Broadcast to every peer
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Continue,
    Quit,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

impl CommandResult {
    pub fn reply(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Continue,
            message: Some(message.into()),
        }
    }

    pub fn silent() -> Self {
        Self {
            status: CommandStatus::Continue,
            message: None,
        }
    }
}
