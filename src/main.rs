// Pong AI decision server
// Serves AI paddle decisions to game clients over WebSocket JSON messages
//
// Usage: pong-ai-server [--listen-addr <addr>]

mod ai;
mod config;
mod protocol;
mod registry;
mod server;

use std::sync::Arc;

use tracing::{info, warn, Level};

use ai::Difficulty;
use registry::SessionRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;

    let args: Vec<String> = std::env::args().collect();
    let listen_addr = match parse_args(&args) {
        Some(addr) => addr,
        None => config.network.listen_addr.clone(),
    };

    tracing_subscriber::fmt()
        .with_max_level(parse_level(&config.logging.level))
        .init();

    let default_difficulty = Difficulty::parse(&config.ai.default_difficulty).unwrap_or_else(|| {
        warn!(
            "Unknown default_difficulty '{}' in config, falling back to medium",
            config.ai.default_difficulty
        );
        Difficulty::Medium
    });
    info!(
        "Auto-provisioned games use {} difficulty",
        default_difficulty.label()
    );

    let registry = Arc::new(SessionRegistry::new());
    server::run(&listen_addr, registry, default_difficulty).await
}

/// Parse command line arguments; returns a listen address override if given
fn parse_args(args: &[String]) -> Option<String> {
    match args.get(1).map(String::as_str) {
        None => None,
        Some("--listen-addr" | "-l") => match args.get(2) {
            Some(addr) => Some(addr.clone()),
            None => {
                eprintln!("Error: --listen-addr requires an address");
                print_usage(&args[0]);
                std::process::exit(1);
            }
        },
        Some("--help" | "-h") => {
            print_usage(&args[0]);
            std::process::exit(0);
        }
        Some(other) => {
            eprintln!("Unknown argument: {}", other);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    println!("Pong AI Server - WebSocket AI opponent for two-paddle ball games");
    println!();
    println!("Usage:");
    println!(
        "  {}                              # Listen on the configured address",
        program
    );
    println!(
        "  {} --listen-addr 0.0.0.0:3000   # Override the listen address",
        program
    );
    println!();
    println!(
        "Configuration is read from {}",
        config::get_config_path().display()
    );
}

fn parse_level(level: &str) -> Level {
    match level {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}
