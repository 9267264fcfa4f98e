//! dirkv Server Binary
//!
//! Starts the TCP server for dirkv.

use std::sync::Arc;

use clap::Parser;
use dirkv::network::Server;
use dirkv::{Config, Engine};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing_subscriber::{fmt, EnvFilter};

/// dirkv Server
#[derive(Parser, Debug)]
#[command(name = "dirkv-server")]
#[command(about = "File-per-record key-value store over a line protocol")]
#[command(version)]
struct Args {
    /// Storage root directory (one file per record)
    #[arg(short = 'd', long, default_value = "./db")]
    storage_root: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    listen: String,

    /// Worker threads (0 = one connection at a time on the accept thread)
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Connection read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,

    /// Connection write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,

    /// Largest value accepted, in bytes
    #[arg(long, default_value = "100")]
    max_value_len: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dirkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("dirkv Server v{}", dirkv::VERSION);
    tracing::info!("Storage root: {}", args.storage_root);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .storage_root(&args.storage_root)
        .listen_addr(&args.listen)
        .workers(args.workers)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .max_value_len(args.max_value_len)
        .build();

    // Open engine (validates config, bootstraps the storage root)
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // SIGINT/SIGTERM flip the shutdown flag; the accept loop notices it
    let shutdown = server.shutdown_handle();
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, shutdown.flag()) {
            tracing::error!("Failed to register signal {}: {}", signal, e);
            std::process::exit(1);
        }
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
