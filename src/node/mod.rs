//! Node core functionality
//!
//! The accept loop, outbound dialing, broadcasting and the `Node` handle that
//! ties them together.

pub mod broadcaster;
pub mod context;
pub mod core;
pub mod dialer;
pub mod listener;

pub use broadcaster::{BroadcastReport, SendOutcome};
pub use context::NodeContext;
pub use self::core::Node;
pub use listener::ListenerState;
