//! dirkv CLI Client
//!
//! Command-line interface for interacting with dirkv.

use std::io::Write;

use clap::{Parser, Subcommand};
use dirkv::network::Client;

/// dirkv CLI
#[derive(Parser, Debug)]
#[command(name = "dirkv-cli")]
#[command(about = "CLI for the dirkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a new key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Send a request line verbatim
    Raw {
        /// The request line, e.g. "GET perro"
        line: String,
    },
}

fn main() {
    let args = Args::parse();
    let client = Client::new(&args.server);

    // The server does all validation; send lines as typed
    let line = match args.command {
        Commands::Get { key } => format!("GET {}", key),
        Commands::Set { key, value } => format!("SET {} {}", key, value),
        Commands::Del { key } => format!("DEL {}", key),
        Commands::Raw { line } => line,
    };

    match client.send_line(&line) {
        Ok(response) => {
            let mut stdout = std::io::stdout();
            if let Err(e) = stdout.write_all(&response).and_then(|()| stdout.flush()) {
                eprintln!("Failed to print response: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
