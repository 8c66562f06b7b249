//! HTTP handlers for purchase return endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{CreatePurchaseReturnInput, DeletePurchaseReturnInput, PurchaseReturnWithDetails};
use crate::services::purchase_return::{DeletedPurchaseReturn, PurchaseReturnReceipt};
use crate::services::PurchaseReturnService;
use crate::store::LedgerStore;
use crate::AppState;

/// Return raw materials to the supplier
pub async fn create_purchase_return<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    payload: Result<Json<CreatePurchaseReturnInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PurchaseReturnReceipt>)> {
    let Json(input) = payload?;
    let service = PurchaseReturnService::new(state.store);
    let receipt = service
        .create(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Get a purchase return with its details
pub async fn get_purchase_return<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseReturnWithDetails>> {
    let service = PurchaseReturnService::new(state.store);
    let purchase_return = service.get(current_user.0.business_id, id).await?;
    Ok(Json(purchase_return))
}

/// Delete a purchase return, id in the body
pub async fn delete_purchase_return<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    payload: Result<Json<DeletePurchaseReturnInput>, JsonRejection>,
) -> AppResult<Json<DeletedPurchaseReturn>> {
    let Json(input) = payload?;
    let service = PurchaseReturnService::new(state.store);
    let deleted = service.delete(current_user.0.business_id, input.id).await?;
    Ok(Json(deleted))
}
