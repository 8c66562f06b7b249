//! Stock-out service: finished goods leaving an outlet

use chrono::Utc;
use serde::Serialize;
use shared::{stock_out_number, CreateStockOutInput, ValidateRequest};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewStockOut, StockOut};
use crate::store::{lock_finished_goods, settle, LedgerStore, LedgerTx};

/// Stock-out service
#[derive(Clone)]
pub struct StockOutService<S> {
    store: S,
}

/// Rows written by one stock-out event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOutBatch {
    pub created: Vec<StockOut>,
    pub stock_out_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedStockOut {
    pub message: String,
}

impl<S: LedgerStore> StockOutService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Ship finished goods. Any line exceeding its balance aborts the event.
    pub async fn create(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: CreateStockOutInput,
    ) -> AppResult<StockOutBatch> {
        input.validate_request()?;

        let now = Utc::now();
        let number = input
            .stock_out_number
            .as_deref()
            .map(str::trim)
            .map(str::to_string)
            .unwrap_or_else(|| stock_out_number(input.outlet_id, now.timestamp_millis()));

        let mut tx = self.store.begin().await?;
        let outcome = ship_lines(&mut tx, business_id, user_id, &input, number, now).await;
        let batch = settle(tx, outcome).await?;

        tracing::info!(
            outlet_id = %input.outlet_id,
            stock_out_number = %batch.stock_out_number,
            lines = batch.created.len(),
            "Stock-out committed"
        );

        Ok(batch)
    }

    /// Delete a stock-out row and put its quantity back
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> AppResult<DeletedStockOut> {
        let mut tx = self.store.begin().await?;
        let outcome = reverse_row(&mut tx, business_id, id).await;
        settle(tx, outcome).await?;

        tracing::info!(stock_out_id = %id, "Stock-out reversed");

        Ok(DeletedStockOut {
            message: "Stock out deleted".to_string(),
        })
    }
}

async fn ship_lines<T: LedgerTx>(
    tx: &mut T,
    business_id: Uuid,
    user_id: Uuid,
    input: &CreateStockOutInput,
    number: String,
    now: chrono::DateTime<Utc>,
) -> AppResult<StockOutBatch> {
    if !tx.outlet_in_business(business_id, input.outlet_id).await? {
        return Err(AppError::NotFound("Outlet".to_string()));
    }

    let transaction_date = input.transaction_date.unwrap_or_else(|| now.date_naive());
    let mut created = Vec::with_capacity(input.items.len());
    let mut goods = lock_finished_goods(
        tx,
        input.outlet_id,
        input.items.iter().map(|line| line.finished_good_id),
    )
    .await?;

    for line in &input.items {
        let good = goods
            .get_mut(&line.finished_good_id)
            .ok_or_else(|| AppError::NotFound("Finished good".to_string()))?;

        let levels = good.levels().ship(line.quantity_out)?;

        let stock_out = tx
            .insert_stock_out(NewStockOut {
                outlet_id: input.outlet_id,
                finished_good_id: good.id,
                quantity_out: line.quantity_out,
                stock_out_number: number.clone(),
                transaction_date,
                proof_images: input.images.clone(),
                notes: input.notes.clone(),
                created_by: user_id,
            })
            .await?;

        tx.write_finished_good_levels(good.id, &levels).await?;
        good.apply_levels(&levels, now);

        tracing::debug!(
            finished_good_id = %good.id,
            quantity_out = %line.quantity_out,
            remaining_stock = %levels.remaining_stock,
            "Finished good shipped"
        );

        created.push(stock_out);
    }

    Ok(StockOutBatch {
        created,
        stock_out_number: number,
    })
}

async fn reverse_row<T: LedgerTx>(tx: &mut T, business_id: Uuid, id: Uuid) -> AppResult<()> {
    let row = tx
        .lock_stock_out(business_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock out".to_string()))?;

    let good = tx
        .lock_finished_good(row.outlet_id, row.finished_good_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Finished good".to_string()))?;

    let levels = good.levels().unship(row.quantity_out)?;
    tx.write_finished_good_levels(good.id, &levels).await?;
    tx.delete_stock_out(row.id).await?;

    Ok(())
}
