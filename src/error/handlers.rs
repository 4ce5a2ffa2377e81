//! Error handlers
//!
//! Uniform reporting of errors that reach the top level.

use crate::error::types::ChatNodeError;
use log::error;

/// Log a chat node error
pub fn handle_error(err: &ChatNodeError) {
    error!("Chat node error: {}", err);
}

/// Whether the process should exit after this error
pub fn is_fatal(err: &ChatNodeError) -> bool {
    matches!(err, ChatNodeError::Listen(_) | ChatNodeError::Config(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CommandError, ListenError};
    use std::io;

    #[test]
    fn test_only_startup_errors_are_fatal() {
        let bind = ChatNodeError::from(ListenError::BindFailed(
            "0.0.0.0:5000".into(),
            io::Error::from(io::ErrorKind::AddrInUse),
        ));
        assert!(is_fatal(&bind));

        let command = ChatNodeError::from(CommandError::MissingArgument("/connect IP:PORT"));
        assert!(!is_fatal(&command));
    }
}
