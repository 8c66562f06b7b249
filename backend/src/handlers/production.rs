//! HTTP handlers for production endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{CreateProductionInput, ProductionRunDetail};
use crate::services::production::ProductionReceipt;
use crate::services::ProductionService;
use crate::store::LedgerStore;
use crate::AppState;

/// Record a production run
pub async fn create_production<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    payload: Result<Json<CreateProductionInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ProductionReceipt>)> {
    let Json(input) = payload?;
    let service = ProductionService::new(state.store);
    let receipt = service
        .produce(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Get a production run with its materials
pub async fn get_production<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductionRunDetail>> {
    let service = ProductionService::new(state.store);
    let run = service.get_run(current_user.0.business_id, id).await?;
    Ok(Json(run))
}
