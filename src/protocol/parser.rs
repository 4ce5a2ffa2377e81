use crate::error::CommandError;
use crate::protocol::commands::Command;

const CONNECT_USAGE: &str = "/connect IP:PORT";
const SAVE_USAGE: &str = "/savehistory chat_history/<filename>";

// Parse one line of user input into a Command
pub fn parse_command(raw: &str) -> Result<Command, CommandError> {
    let trimmed = raw.trim();
    let mut parts = trimmed.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match cmd.as_str() {
        "/quit" if args.is_empty() => Ok(Command::Quit),
        "/list" if args.is_empty() => Ok(Command::List),
        "/history" if args.is_empty() => Ok(Command::History),
        "/clearhistory" if args.is_empty() => Ok(Command::ClearHistory),
        "/connect" => match args.as_slice() {
            [target] => Ok(Command::Connect(target.parse()?)),
            _ => Err(CommandError::MissingArgument(CONNECT_USAGE)),
        },
        "/savehistory" => match args.as_slice() {
            [file] => Ok(Command::SaveHistory(file.to_string())),
            _ => Err(CommandError::MissingArgument(SAVE_USAGE)),
        },
        _ => Ok(Command::Message(raw.trim_end_matches(['\r', '\n']).to_string())),
    }
}
