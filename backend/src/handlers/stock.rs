//! HTTP handlers for outlet stock listings

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{
    export_to_csv, FinishedGoodRecord, RawMaterialRecord, StockOutRecord,
};
use crate::services::StockService;
use crate::store::LedgerStore;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub format: Option<String>, // "json" or "csv"
}

impl ListQuery {
    fn wants_csv(&self) -> bool {
        self.format.as_deref() == Some("csv")
    }
}

fn csv_response<T: Serialize>(records: &[T], filename: &str) -> AppResult<Response> {
    let csv = export_to_csv(records)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}

/// List raw materials of an outlet
pub async fn list_raw_materials<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    Path(outlet_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> AppResult<Response> {
    let service = StockService::new(state.store);
    let rows = service
        .raw_materials(current_user.0.business_id, outlet_id)
        .await?;

    if query.wants_csv() {
        let records: Vec<RawMaterialRecord> = rows.iter().map(Into::into).collect();
        csv_response(&records, "raw_materials.csv")
    } else {
        Ok(Json(rows).into_response())
    }
}

/// List finished goods of an outlet
pub async fn list_finished_goods<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    Path(outlet_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> AppResult<Response> {
    let service = StockService::new(state.store);
    let rows = service
        .finished_goods(current_user.0.business_id, outlet_id)
        .await?;

    if query.wants_csv() {
        let records: Vec<FinishedGoodRecord> = rows.iter().map(Into::into).collect();
        csv_response(&records, "finished_goods.csv")
    } else {
        Ok(Json(rows).into_response())
    }
}

/// List stock-outs of an outlet, newest first
pub async fn list_stock_outs<S: LedgerStore>(
    State(state): State<AppState<S>>,
    current_user: CurrentUser,
    Path(outlet_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> AppResult<Response> {
    let service = StockService::new(state.store);
    let rows = service
        .stock_outs(current_user.0.business_id, outlet_id)
        .await?;

    if query.wants_csv() {
        let records: Vec<StockOutRecord> = rows.iter().map(Into::into).collect();
        csv_response(&records, "stock_outs.csv")
    } else {
        Ok(Json(rows).into_response())
    }
}
