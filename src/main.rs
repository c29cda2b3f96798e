//! Key Registry Server
//!
//! Serves the key list over HTTP and lets a key generator add, update and
//! remove keys with a shared secret.
//!
//! Usage:
//!   key-registry --api-key <SECRET> --port 5000 --keys-file server_keys.json

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use key_registry::{ApiSecret, AppState, KeyFile, KeyRegistry, build_router};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_KEYS_FILE: &str = "server_keys.json";

#[derive(Parser, Debug)]
#[command(name = "key-registry")]
#[command(about = "HTTP registry for license and activation keys")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Path to the keys file (defaults to server_keys.json next to the executable)
    #[arg(short, long, env = "KEYS_FILE")]
    keys_file: Option<PathBuf>,

    /// Shared secret expected in the X-API-Key header for write operations
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn api_secret(&self) -> Result<ApiSecret> {
        let secret = ApiSecret::new(self.api_key.clone());
        ensure!(!secret.is_empty(), "API key must not be empty");
        Ok(secret)
    }

    fn keys_path(&self) -> PathBuf {
        self.keys_file.clone().unwrap_or_else(default_keys_path)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Key registry starting...");

    let secret = args.api_secret()?;
    let keys_file = KeyFile::new(args.keys_path());
    if keys_file
        .initialize()
        .with_context(|| format!("Failed to initialize keys file {:?}", keys_file.path()))?
    {
        info!("Created empty keys file at {:?}", keys_file.path());
    }

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", args.host, args.port))?;
    let addr = listener
        .local_addr()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], args.port)));

    println!("\n========================================");
    println!("  Key Registry Running");
    println!("========================================");
    println!("  Listening: http://{}", addr);
    println!("  Keys file: {}", keys_file.path().display());
    println!("========================================\n");

    let state = Arc::new(AppState::new(KeyRegistry::new(keys_file), secret));
    let app = build_router(state);

    info!("HTTP API listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Key registry stopped");
    Ok(())
}

/// `server_keys.json` beside the executable, or in the working directory
/// when the executable path cannot be resolved.
fn default_keys_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_KEYS_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_KEYS_FILE))
}

/// Wait for SIGTERM or SIGINT signal
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal"),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Starting graceful shutdown...");
}
