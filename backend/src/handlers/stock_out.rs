//! HTTP handlers for stock-out endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::CreateStockOutInput;
use crate::services::stock_out::{DeletedStockOut, StockOutBatch};
use crate::services::StockOutService;
use crate::store::LedgerStore;
use crate::AppState;

/// Ship finished goods out of an outlet
pub async fn create_stock_out<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    payload: Result<Json<CreateStockOutInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<StockOutBatch>)> {
    let Json(input) = payload?;
    let service = StockOutService::new(state.store);
    let batch = service
        .create(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Delete a stock-out row and restore its quantity
pub async fn delete_stock_out<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeletedStockOut>> {
    let service = StockOutService::new(state.store);
    let deleted = service.delete(current_user.0.business_id, id).await?;
    Ok(Json(deleted))
}
