//! Message history
//!
//! The bounded in-memory log of chat lines and its file export.

pub mod export;
pub mod store;

pub use export::{read_history, save_history};
pub use store::{Direction, HistoryEntry, HistoryLog};
