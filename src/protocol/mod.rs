//! Chat protocol
//!
//! The line format peers exchange, and the console commands a user types.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod wire;

pub use commands::{Command, CommandResult, CommandStatus};
pub use handlers::handle_command;
pub use parser::parse_command;
