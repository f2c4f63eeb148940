use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventseal::api::{self, AppState};
use eventseal::config::Config;
use eventseal::db;
use eventseal::services::solana_minter::{NftMinter, SolanaNftMinter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventseal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting EventSeal server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        network = ?config.solana_network,
        rpc_url = %config.rpc_url(),
        "Configuration loaded successfully"
    );

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Set up the NFT minter
    let minter: Option<Arc<dyn NftMinter>> = match SolanaNftMinter::from_config(&config)? {
        Some(minter) => {
            tracing::info!(payer = %minter.payer_address(), "NFT minting enabled");
            Some(Arc::new(minter) as Arc<dyn NftMinter>)
        }
        None => {
            tracing::warn!(
                "MINTER_PRIVATE_KEY not set; attendances will be recorded without NFTs"
            );
            None
        }
    };

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        minter,
    };

    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, cleaning up...");
}
