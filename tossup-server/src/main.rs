use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use tossup_core::PuzzleLibrary;
use tossup_server::{
    config::Config, create_routes, narration::narrator_from_config, registry::RoomRegistry,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Toss-Up server...");

    // Initialize application state
    let config = Config::new();
    let connection_manager = Arc::new(ConnectionManager::new());

    info!("Loading puzzles from: {}", config.puzzles_file);
    let puzzles = Arc::new(PuzzleLibrary::load_or_builtin(&config.puzzles_file));
    let narrator = narrator_from_config(&config.narration);

    let registry = Arc::new(RoomRegistry::new(
        config.room_settings(),
        puzzles,
        connection_manager.clone(),
        narrator,
    ));

    let routes = create_routes(
        connection_manager.clone(),
        registry.clone(),
        config.connection_limits(),
    );

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_registry = registry.clone();
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;

            cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            cleanup_registry.sweep_closed();
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("Failed to install SIGINT handler");
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
