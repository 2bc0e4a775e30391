//! Courier CLI
//!
//! Interactive command-line client for Courier - end-to-end encrypted
//! relay messaging.

mod commands;
mod config;
mod display;
mod menu;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use courier_core::identity::FileIdentityStore;
use courier_core::network::{TcpTransport, TransportConfig};
use courier_core::session::SessionClient;

use config::CliConfig;
use menu::MenuAction;

#[derive(Parser)]
#[command(name = "courier")]
#[command(version, about = "End-to-end encrypted relay messaging")]
struct Cli {
    /// Data directory (default: current directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Relay server address, overridden by a server.info file in the
    /// data directory
    #[arg(long, env = "COURIER_SERVER", default_value = "127.0.0.1:1357")]
    server: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&data_dir)?;

    let mut config = CliConfig {
        data_dir,
        server_addr: cli.server,
    };
    config.resolve_server_addr()?;

    let transport = TcpTransport::new(TransportConfig {
        server_addr: config.server_addr.clone(),
    });
    let store = FileIdentityStore::new(config.identity_path());
    let mut client = SessionClient::new(transport, Box::new(store))?;

    if let Some(identity) = client.identity() {
        display::info(&format!("Welcome back, {}.", identity.name()));
    }

    run_menu_loop(&mut client)
}

/// Reads menu codes from stdin until EOF or an explicit exit.
fn run_menu_loop(client: &mut SessionClient<TcpTransport>) -> Result<()> {
    let stdin = io::stdin();
    print!("{}", menu::USAGE);

    loop {
        print!("? ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let Some(action) = MenuAction::parse(&line) else {
            display::error("Operation does not exist");
            continue;
        };

        // One failed action never ends the session.
        let outcome = match action {
            MenuAction::Register => commands::register(client),
            MenuAction::ListPeers => commands::list_peers(client),
            MenuAction::FetchPublicKey => commands::fetch_public_key(client),
            MenuAction::PollMessages => commands::poll_messages(client),
            MenuAction::SendText => commands::send_text(client),
            MenuAction::RequestSessionKey => commands::request_session_key(client),
            MenuAction::SendSessionKey => commands::send_session_key(client),
            MenuAction::SendFile => commands::send_file(client),
            MenuAction::Exit => break,
        };

        if let Err(e) = outcome {
            display::error(&format!("{:#}", e));
        }
    }

    println!("Bye bye!");
    Ok(())
}
