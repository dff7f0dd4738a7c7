//! Crypto Briefing MCP Server
//!
//! Serves the briefing tools over MCP streamable HTTP on a fixed port.
//! The Telegram session is opened once here and closed on shutdown.

mod handlers;
mod state;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crypto_briefing::{BriefingConfig, ChannelSession};

use crate::handlers::{health_check, mcp_delete, mcp_get, mcp_post};
use crate::state::AppState;

const BIND_ADDR: &str = "0.0.0.0:8123";

/// Build the router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/mcp", get(mcp_get).post(mcp_post).delete(mcp_delete))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BriefingConfig::from_env()?;

    // One channel session for the whole process
    let channel = ChannelSession::connect(config.telegram.as_ref()).await;
    if channel.is_connected() {
        tracing::info!("✓ Telegram session ready");
    } else {
        tracing::warn!("⚠ Telegram session unavailable - news and whale alerts disabled");
        tracing::warn!("  Run `telegram-login` and set TELEGRAM_SESSION_STRING in .env");
    }

    let tools = crypto_briefing::live_registry(&config, &channel)?;
    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let state = AppState::new(tools, channel.clone(), config.coingecko_api_key.is_some());
    let listener = tokio::net::TcpListener::bind(BIND_ADDR).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto briefing MCP server on http://{}/mcp", BIND_ADDR);
    tracing::info!("══════════════════════════════════════════════════");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    channel.shutdown().await;
    Ok(())
}
