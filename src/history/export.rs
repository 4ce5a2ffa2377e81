//! History export
//!
//! Writes a snapshot of the history log to a plain text file and reads it back.

use chrono::Local;
use log::info;
use std::path::Path;
use tokio::fs;

use crate::error::HistoryError;
use crate::history::store::TIMESTAMP_FORMAT;

/// Number of header lines preceding the entries in a saved file.
pub const HEADER_LINES: usize = 2;

/// Writes the export header followed by `lines`, one per line.
///
/// Missing parent directories are created. Returns the number of entries
/// written.
pub async fn save_history(
    path: &Path,
    username: &str,
    lines: &[String],
) -> Result<usize, HistoryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut contents = String::new();
    contents.push_str(&format!("Chat History for: {}\n", username));
    contents.push_str(&format!(
        "Saved on: {}\n",
        Local::now().format(TIMESTAMP_FORMAT)
    ));
    for line in lines {
        contents.push_str(line);
        contents.push('\n');
    }

    fs::write(path, contents).await?;
    info!("Saved {} history entries to {}", lines.len(), path.display());
    Ok(lines.len())
}

/// Reads a file written by [`save_history`], returning only the entry lines.
pub async fn read_history(path: &Path) -> Result<Vec<String>, HistoryError> {
    let contents = fs::read_to_string(path).await?;
    Ok(contents
        .lines()
        .skip(HEADER_LINES)
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{Direction, HistoryLog};

    #[tokio::test]
    async fn test_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_history").join("out.txt");

        let mut log = HistoryLog::default();
        log.record(Direction::Sent, "Connected to 127.0.0.1:5000");
        log.record(Direction::Received, "*** bob has connected ***");
        log.record(Direction::Sent, "[alice]: hi");
        let lines = log.export_lines();

        let written = save_history(&path, "alice", &lines).await.unwrap();
        assert_eq!(written, 3);
        assert_eq!(read_history(&path).await.unwrap(), lines);
    }

    #[tokio::test]
    async fn test_header_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");

        save_history(&path, "alice", &[]).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let header: Vec<&str> = contents.lines().collect();
        assert_eq!(header.len(), HEADER_LINES);
        assert_eq!(header[0], "Chat History for: alice");
        assert!(header[1].starts_with("Saved on: "));
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_history(&dir.path().join("nope.txt")).await;
        assert!(matches!(result, Err(HistoryError::Io(_))));
    }
}
