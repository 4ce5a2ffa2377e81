//! RAX Chat - Entry Point
//!
//! Starts a chat node and runs the interactive prompt on stdin.

use log::{error, info};
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use rax_chat::display::ConsoleDisplay;
use rax_chat::display::console::format_banner;
use rax_chat::error::{ChatNodeError, handle_error, is_fatal};
use rax_chat::protocol::{CommandStatus, handle_command, parse_command};
use rax_chat::{Node, NodeConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let mut config = match NodeConfig::load() {
        Ok(config) => config,
        Err(e) => exit_with(ChatNodeError::from(e)),
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if config.username.trim().is_empty() {
        config.username = ask(&mut input, "Enter your username: ").await;
    }
    while config.port == 0 {
        let answer = ask(&mut input, "Enter your port number (>1024): ").await;
        match answer.parse::<u16>() {
            Ok(port) if port > 1024 => config.port = port,
            _ => println!("Invalid port: {}", answer),
        }
    }

    let display = Arc::new(ConsoleDisplay::new(&config.username));
    let node = match Node::start(config, display.clone()).await {
        Ok(node) => node,
        Err(e) => exit_with(ChatNodeError::from(e)),
    };

    info!("Launching chat prompt...");
    println!("{}", format_banner(node.username(), node.local_addr().port()));

    loop {
        display.prompt();
        let line = match input.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // stdin closed: leave as if /quit was typed
                node.shutdown().await;
                break;
            }
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                node.shutdown().await;
                break;
            }
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let result = handle_command(&node, command).await;
        if let Some(message) = result.message {
            println!("\n{}", message);
        }
        if result.status == CommandStatus::Quit {
            break;
        }
    }
}

async fn ask(input: &mut Lines<BufReader<Stdin>>, question: &str) -> String {
    print!("{}", question);
    let _ = io::stdout().flush();
    match input.next_line().await {
        Ok(Some(line)) => line.trim().to_string(),
        Ok(None) => process::exit(0),
        Err(e) => exit_with(ChatNodeError::from(e)),
    }
}

fn exit_with(err: ChatNodeError) -> ! {
    handle_error(&err);
    eprintln!("{}", err);
    process::exit(if is_fatal(&err) { 1 } else { 2 })
}
