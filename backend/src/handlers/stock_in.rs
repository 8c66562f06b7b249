//! HTTP handlers for stock-in endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::CreateStockInInput;
use crate::services::receiving::{DeletedStockIn, StockInBatch};
use crate::services::ReceivingService;
use crate::store::LedgerStore;
use crate::AppState;

/// Receive purchase invoice lines into stock
pub async fn create_stock_in<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    payload: Result<Json<CreateStockInInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<StockInBatch>)> {
    let Json(input) = payload?;
    let service = ReceivingService::new(state.store);
    let batch = service
        .receive(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Delete a stock-in row
pub async fn delete_stock_in<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeletedStockIn>> {
    let service = ReceivingService::new(state.store);
    let deleted = service.delete(current_user.0.business_id, id).await?;
    Ok(Json(deleted))
}
