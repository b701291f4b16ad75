//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for settlements, customers and the ledger
//! - Error-to-response mapping
//! - Request and response types

pub mod error;
pub mod routes;

use axum::Router;
use bahi_core::settlement::{CarryOverResolver, SeedCache, SettlementStore};
use bahi_shared::SettlementConfig;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Settlement persistence.
    pub store: Arc<dyn SettlementStore>,
    /// Business-day aware carry-over resolver.
    pub resolver: CarryOverResolver,
    /// Memoized carry-over seeds.
    pub seed_cache: SeedCache,
    /// Settlement settings.
    pub settlement: Arc<SettlementConfig>,
}

impl AppState {
    /// Builds the state for a store and settlement settings.
    pub fn new(store: Arc<dyn SettlementStore>, settlement: SettlementConfig) -> Self {
        Self {
            store,
            resolver: CarryOverResolver::new(settlement.business_timezone),
            seed_cache: SeedCache::with_config(
                settlement.seed_cache_capacity,
                settlement.seed_cache_ttl_secs,
            ),
            settlement: Arc::new(settlement),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
