//! Wire format
//!
//! Peers exchange plain UTF-8 lines terminated by `\n`. Two shapes are
//! recognised, anything else is carried as an opaque chat line:
//!
//! - hello: `*** <username> has connected ***`
//! - chat:  `[<username>]: <text>`

const HELLO_PREFIX: &str = "*** ";
const HELLO_SUFFIX: &str = " has connected ***";

/// A received line, classified by shape.
#[derive(Debug, PartialEq, Eq)]
pub enum WireLine<'a> {
    Hello { username: &'a str },
    Chat { username: &'a str, text: &'a str },
    Other(&'a str),
}

pub fn format_hello(username: &str) -> String {
    format!("{HELLO_PREFIX}{}{HELLO_SUFFIX}", single_line(username))
}

pub fn format_chat(username: &str, text: &str) -> String {
    format!("[{}]: {}", single_line(username), single_line(text))
}

pub fn classify(line: &str) -> WireLine<'_> {
    if let Some(username) = line
        .strip_prefix(HELLO_PREFIX)
        .and_then(|rest| rest.strip_suffix(HELLO_SUFFIX))
    {
        return WireLine::Hello { username };
    }

    if let Some((username, text)) = line
        .strip_prefix('[')
        .and_then(|rest| rest.split_once("]: "))
    {
        return WireLine::Chat { username, text };
    }

    WireLine::Other(line)
}

/// Turns raw bytes read up to and including `\n` into a line of text.
///
/// Invalid UTF-8 is replaced rather than rejected. Only the line terminator
/// (`\n` or `\r\n`) is dropped; any other trailing `\r` is kept.
pub fn decode_line(raw: &[u8]) -> String {
    let line = match raw.strip_suffix(b"\n") {
        Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
        None => raw,
    };
    String::from_utf8_lossy(line).into_owned()
}

// Embedded line breaks would split one message into several on the wire
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
