//! Stock Ledger Engine - Backend
//!
//! Keeps raw material and finished good balances consistent across receiving,
//! production, stock-out and purchase return events.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use store::{LedgerStore, PgLedgerStore};

#[cfg(any(test, feature = "test-util"))]
pub use store::MemoryLedgerStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S = PgLedgerStore> {
    pub store: S,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app<S: LedgerStore>(state: AppState<S>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let jwt_secret: Arc<str> = Arc::from(state.config.jwt.secret.as_str());

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check::<S>))
        .nest("/api/v1", routes::api_routes(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Stock Ledger Engine API v1.0"
}
