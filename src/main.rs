//! WalletScore API Server
//!
//! REST API for explainable wallet risk decisions
//!
//! Usage:
//!   cargo run --bin walletscore_api
//!
//! Environment:
//!   ETHERSCAN_API_KEY - Etherscan V2 API key (required)
//!   PORT              - Server port (default: 8080)
//!   WALLETSCORE_HOST  - Server host (default: 0.0.0.0)
//!   RUST_LOG          - Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use walletscore::api::{create_router, handlers::AppState, start_cleanup_task};
use walletscore::{EtherscanClient, ServerConfig, TelemetryCollector};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = ServerConfig::from_env()?;

    let provider = Arc::new(EtherscanClient::new(config.etherscan_api_key.clone()));
    let telemetry = Arc::new(TelemetryCollector::new());
    let telemetry_for_shutdown = telemetry.clone();

    // Create app state
    let state = Arc::new(AppState::new(provider, telemetry));
    let cache_for_shutdown = state.cache.clone();

    // Start background cleanup task for rate limiter
    start_cleanup_task();
    info!("🧹 Background cleanup task started");

    // Create router
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🚀 WalletScore API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  GET /v1/score    - Wallet risk decision (wallet, profile?)");
    info!("  GET /v1/features - Behavioral feature vector (wallet)");
    info!("  GET /v1/compare  - Two-wallet comparison (wallet_a, wallet_b, profile?)");
    info!("  GET /v1/stats    - Service statistics");
    info!("  GET /v1/health   - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Graceful shutdown sequence
    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");

    let stats = telemetry_for_shutdown.get_stats();
    info!("   Decisions served: {}", stats.decisions_total);
    info!("   Comparisons: {}", stats.comparisons);
    info!("   Cache entries at shutdown: {}", cache_for_shutdown.stats().entries);

    info!("👋 WalletScore API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ================================================================

       W A L L E T S C O R E

       Explainable on-chain credit decisions for DeFi lending
       v{}

    ================================================================
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
