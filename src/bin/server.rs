//! respkv Server Binary
//!
//! Replays the append-only log and starts the TCP server.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use respkv::network::Server;
use respkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// respkv Server
#[derive(Parser, Debug)]
#[command(name = "respkv-server")]
#[command(about = "Minimal key-value store with an append-only log")]
#[command(version)]
struct Args {
    /// Append-only log file
    #[arg(short, long, default_value = "./appendonly.aof")]
    aof_path: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Milliseconds between background fsyncs of the log
    #[arg(short, long, default_value = "1000")]
    sync_interval_ms: u64,

    /// Run purely in memory: no log is written or replayed
    #[arg(long)]
    no_appendonly: bool,

    /// Client read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,respkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("respkv Server v{}", respkv::VERSION);
    tracing::info!("Append-only log: {}", args.aof_path);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .aof_path(&args.aof_path)
        .appendonly(!args.no_appendonly)
        .sync_interval(Duration::from_millis(args.sync_interval_ms))
        .listen_addr(&args.listen)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    // Open engine (replays the log)
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    let server = match Server::bind(config, Arc::clone(&engine)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    drop(server);
    match Arc::try_unwrap(engine) {
        Ok(engine) => {
            if let Err(e) = engine.close() {
                tracing::error!("Failed to close engine: {}", e);
                std::process::exit(1);
            }
        }
        Err(_) => tracing::warn!("Engine still shared at exit; skipping final sync"),
    }

    tracing::info!("Server stopped");
}
