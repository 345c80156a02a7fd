mod api;
mod auth;
mod config;
mod directory;
mod market;
mod websocket;

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::net::TcpListener;
use tokio::time::interval;
use tower_http::cors::CorsLayer;

use crate::api::{create_api_router, ApiState};
use crate::auth::SessionManager;
use crate::config::{Config, CLEANUP_INTERVAL_SECS};
use crate::market::{MarketCache, QuoteSource, YahooProvider};
use crate::websocket::{handle_connection, BroadcasterHandle, LiveBroadcaster, StreamState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    config.log_config();

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e.into());
    }

    // Shared state
    let source: Arc<dyn QuoteSource> = Arc::new(YahooProvider::new(
        &config.provider_base_url,
        Duration::from_secs(config.fetch_timeout_secs),
    )?);
    let cache = Arc::new(MarketCache::new(
        source.clone(),
        Duration::from_secs(config.cache_ttl_secs),
        config.fetch_concurrency,
    ));
    let session_manager = SessionManager::new();
    let broadcaster = Arc::new(LiveBroadcaster::new(
        source.clone(),
        Duration::from_secs(config.stream_interval_secs),
        Duration::from_secs(config.stream_backoff_secs),
    ));

    // Background tasks
    let broadcast_handle = start_background_tasks(session_manager.clone(), broadcaster.clone());
    info!(
        "Started live broadcast loop (every {}s) for {} tracked companies",
        config.stream_interval_secs,
        directory::company_count()
    );

    // Dashboard API server
    let api_state = ApiState {
        sessions: session_manager.clone(),
        cache: cache.clone(),
        source: source.clone(),
    };
    let api_router = create_api_router(api_state).layer(CorsLayer::permissive());

    let api_listener = TcpListener::bind(&config.bind_address).await?;
    info!("HTTP dashboard running at http://{}", config.bind_address);

    let api_server = axum::serve(api_listener, api_router);

    // WebSocket streaming server
    let ws_listener = TcpListener::bind(&config.ws_bind_address).await?;
    info!("WebSocket stream running at ws://{}", config.ws_bind_address);

    let stream_state = Arc::new(StreamState {
        broadcaster: broadcaster.clone(),
        source: source.clone(),
    });

    let websocket_server = async move {
        while let Ok((stream, addr)) = ws_listener.accept().await {
            let state = stream_state.clone();
            let peer_addr = addr.to_string();

            tokio::spawn(async move {
                handle_connection(state, stream, peer_addr).await;
            });
        }
    };

    // Run both servers concurrently
    tokio::select! {
        result = api_server => {
            error!("API server stopped: {:?}", result);
        }
        _ = websocket_server => {
            error!("WebSocket server stopped");
        }
    }

    broadcast_handle.stop().await;
    Ok(())
}

fn start_background_tasks(
    session_manager: SessionManager,
    broadcaster: Arc<LiveBroadcaster>,
) -> BroadcasterHandle {
    // Session cleanup task
    tokio::spawn(async move {
        let mut interval_timer = interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

        loop {
            interval_timer.tick().await;
            session_manager.cleanup_stale_sessions();

            let count = session_manager.session_count();
            if count > 0 {
                info!("Active dashboard sessions: {}", count);
            }
        }
    });

    // Live broadcast loop
    broadcaster.spawn()
}
