//! Bahi settlement server.
//!
//! Main entry point for the settlement HTTP service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bahi_api::{AppState, create_router};
use bahi_core::settlement::{InMemorySettlementStore, SettlementStore};
use bahi_db::{SettlementRepository, connect_with};
use bahi_shared::{AppConfig, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bahi=debug,bahi_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let store: Arc<dyn SettlementStore> = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = connect_with(&config.database).await?;
            info!(
                max_connections = config.database.max_connections,
                "Connected to database"
            );
            Arc::new(SettlementRepository::new(db))
        }
        StorageBackend::Memory => {
            info!("Using in-memory settlement store");
            Arc::new(InMemorySettlementStore::new())
        }
    };

    info!(
        timezone = %config.settlement.business_timezone,
        deduction_rate = %config.settlement.default_deduction_rate_percent,
        batch_concurrency = config.settlement.batch_concurrency,
        "Settlement settings loaded"
    );

    let state = AppState::new(store, config.settlement.clone());
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
