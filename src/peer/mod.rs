//! Peer management
//!
//! Peer addresses, live connections, the registry that owns them, and the
//! per-connection read loop.

pub mod address;
pub mod connection;
pub mod reader;
pub mod registry;

pub use address::PeerAddress;
pub use connection::{ConnectionStatus, PeerConnection, PeerStreamReader, PeerWriter};
pub use reader::PeerReader;
pub use registry::ConnectionRegistry;
