//! Route definitions for the Stock Ledger platform

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, store::LedgerStore, AppState};

/// Create API routes. Everything except the health check requires a bearer
/// token signed with `jwt_secret`.
pub fn api_routes<S: LedgerStore>(jwt_secret: Arc<str>) -> Router<AppState<S>> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check::<S>))
        .merge(ledger_routes::<S>().route_layer(middleware::from_fn_with_state(
            jwt_secret,
            auth_middleware,
        )))
}

/// Ledger routes (protected)
fn ledger_routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/stock-ins", post(handlers::create_stock_in::<S>))
        .route("/stock-ins/:id", delete(handlers::delete_stock_in::<S>))
        .route("/productions", post(handlers::create_production::<S>))
        .route("/productions/:id", get(handlers::get_production::<S>))
        .route("/stock-outs", post(handlers::create_stock_out::<S>))
        .route("/stock-outs/:id", delete(handlers::delete_stock_out::<S>))
        .route(
            "/purchase-returns",
            post(handlers::create_purchase_return::<S>),
        )
        .route(
            "/purchase-returns/delete",
            post(handlers::delete_purchase_return::<S>),
        )
        .route(
            "/purchase-returns/:id",
            get(handlers::get_purchase_return::<S>),
        )
        .nest("/outlets/:outlet_id", outlet_routes::<S>())
}

/// Stock listings of one outlet
fn outlet_routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/raw-materials", get(handlers::list_raw_materials::<S>))
        .route("/finished-goods", get(handlers::list_finished_goods::<S>))
        .route("/stock-outs", get(handlers::list_stock_outs::<S>))
}
