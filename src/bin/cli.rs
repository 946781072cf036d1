//! hostlink CLI
//!
//! Command-line interface for poking a hosting-management server.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use hostlink::{Config, Connector, TableId};

/// hostlink CLI
#[derive(Parser, Debug)]
#[command(name = "hostlink-cli")]
#[command(about = "CLI for the hostlink client runtime")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:4582")]
    server: String,

    /// Username presented on connect
    #[arg(short, long, default_value = "")]
    username: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Perform the handshake and print the assigned connector ID
    ConnectorId,

    /// Ask the server to broadcast an invalidation for one table
    Invalidate {
        /// Table ID to invalidate
        table: u16,

        /// Optional scope qualifier passed to the server
        #[arg(short, long)]
        scope: Option<String>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hostlink=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .server_addr(&args.server)
        .connect_username(&args.username)
        .build();

    let connector = match Connector::connect(config, Vec::new()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to build connector: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Ping => connector.ping().map(|_| "pong".to_string()),
        Commands::ConnectorId => connector.connector_id().map(|id| id.to_string()),
        Commands::Invalidate { table, scope } => connector
            .invalidate_remote(TableId(table), scope.as_deref())
            .map(|_| format!("invalidated table {}", table)),
    };

    match outcome {
        Ok(message) => println!("{}", message),
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
