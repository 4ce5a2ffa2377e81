//! Error types
//!
//! Defines domain-specific error types for each part of the chat node.

use std::fmt;
use std::io;
use std::time::Duration;

use crate::peer::PeerAddress;

/// Connection registry errors
#[derive(Debug)]
pub enum RegistryError {
    AlreadyConnected(PeerAddress),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyConnected(addr) => write!(f, "Already connected to: {}", addr),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Outbound connection errors
#[derive(Debug)]
pub enum DialError {
    AlreadyConnected(PeerAddress),
    ResolveFailed(PeerAddress, io::Error),
    ConnectFailed(PeerAddress, io::Error),
    Timeout(PeerAddress, Duration),
    HelloFailed(PeerAddress, io::Error),
    ShuttingDown,
}

impl fmt::Display for DialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialError::AlreadyConnected(addr) => write!(f, "Already connected to: {}", addr),
            DialError::ResolveFailed(addr, e) => {
                write!(f, "Failed to resolve {}: {}", addr, e)
            }
            DialError::ConnectFailed(addr, e) => {
                write!(f, "Failed to connect to {}: {}", addr, e)
            }
            DialError::Timeout(addr, after) => write!(
                f,
                "Failed to connect to {}: timed out after {}s",
                addr,
                after.as_secs()
            ),
            DialError::HelloFailed(addr, e) => {
                write!(f, "Failed to greet {}: {}", addr, e)
            }
            DialError::ShuttingDown => write!(f, "Node is shutting down"),
        }
    }
}

impl std::error::Error for DialError {}

impl From<RegistryError> for DialError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::AlreadyConnected(addr) => DialError::AlreadyConnected(addr),
        }
    }
}

/// Listening socket errors
#[derive(Debug)]
pub enum ListenError {
    BindFailed(String, io::Error),
}

impl fmt::Display for ListenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenError::BindFailed(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
        }
    }
}

impl std::error::Error for ListenError {}

/// Command line errors
#[derive(Debug, PartialEq)]
pub enum CommandError {
    MissingArgument(&'static str),
    InvalidAddress(String),
    InvalidPort(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::MissingArgument(usage) => write!(f, "Usage: {}", usage),
            CommandError::InvalidAddress(s) => {
                write!(f, "Invalid address '{}'. Use: /connect IP:PORT", s)
            }
            CommandError::InvalidPort(s) => write!(f, "Invalid port: {}", s),
        }
    }
}

impl std::error::Error for CommandError {}

/// History export errors
#[derive(Debug)]
pub enum HistoryError {
    Io(io::Error),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Io(e) => write!(f, "Error saving history: {}", e),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<io::Error> for HistoryError {
    fn from(error: io::Error) -> Self {
        HistoryError::Io(error)
    }
}

/// General chat node error that encompasses all error types
#[derive(Debug)]
pub enum ChatNodeError {
    Registry(RegistryError),
    Dial(DialError),
    Listen(ListenError),
    Command(CommandError),
    History(HistoryError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for ChatNodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatNodeError::Registry(e) => write!(f, "Registry error: {}", e),
            ChatNodeError::Dial(e) => write!(f, "Connection error: {}", e),
            ChatNodeError::Listen(e) => write!(f, "Listener error: {}", e),
            ChatNodeError::Command(e) => write!(f, "Command error: {}", e),
            ChatNodeError::History(e) => write!(f, "History error: {}", e),
            ChatNodeError::Config(e) => write!(f, "Configuration error: {}", e),
            ChatNodeError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ChatNodeError {}

// Implement conversions from specific errors to ChatNodeError
impl From<RegistryError> for ChatNodeError {
    fn from(error: RegistryError) -> Self {
        ChatNodeError::Registry(error)
    }
}

impl From<DialError> for ChatNodeError {
    fn from(error: DialError) -> Self {
        ChatNodeError::Dial(error)
    }
}

impl From<ListenError> for ChatNodeError {
    fn from(error: ListenError) -> Self {
        ChatNodeError::Listen(error)
    }
}

impl From<CommandError> for ChatNodeError {
    fn from(error: CommandError) -> Self {
        ChatNodeError::Command(error)
    }
}

impl From<HistoryError> for ChatNodeError {
    fn from(error: HistoryError) -> Self {
        ChatNodeError::History(error)
    }
}

impl From<config::ConfigError> for ChatNodeError {
    fn from(error: config::ConfigError) -> Self {
        ChatNodeError::Config(error)
    }
}

impl From<io::Error> for ChatNodeError {
    fn from(error: io::Error) -> Self {
        ChatNodeError::IoError(error)
    }
}
