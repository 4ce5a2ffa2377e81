//! RAX chat - a peer-to-peer chat node.
//!
//! Each node listens for inbound TCP peers and dials outbound ones, keeping a
//! mesh of direct links and broadcasting typed lines to all of them.

pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod node;
pub mod peer;
pub mod protocol;

pub use crate::config::NodeConfig;
pub use node::Node;
