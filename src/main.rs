//! Arena Server - authoritative multiplayer state server
//!
//! This is the main entry point for the game server. It handles:
//! - The TCP game stream (accept loop + one reader per connection)
//! - Periodic coin relocation
//! - The optional admin HTTP endpoints
//! - The operator console on stdin

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_server::app::console::spawn_console;
use arena_server::config::{Config, LogFormat};
use arena_server::game::ticker::run_coin_ticker;
use arena_server::http::build_router;
use arena_server::net::run_acceptor;
use arena_server::util::time::init_server_time;
use arena_server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Arena Server");

    let state = AppState::new(config.clone());

    // Start game stream listener
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    // Spawn coin relocation
    tokio::spawn(run_coin_ticker(state.clone(), config.coin_interval));

    // Spawn operator console
    if config.console_enabled {
        spawn_console(state.world.clone())?;
    }

    // Spawn admin endpoints
    if let Some(admin_addr) = config.admin_addr {
        let router = build_router(state.clone());
        let admin_listener = TcpListener::bind(admin_addr).await?;
        info!("Admin endpoints: http://{}/health", admin_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(admin_listener, router).await {
                error!(error = %e, "Admin server failed");
            }
        });
    }

    tokio::select! {
        _ = run_acceptor(listener, state) => {}
        _ = shutdown_signal() => {}
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
