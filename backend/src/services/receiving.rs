//! Receiving service: purchase invoice lines into raw material stock

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    line_total, lookup_plan, resolve_raw_material, CreateStockInInput, StockInLine,
    ValidateRequest,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{InvoiceItemContext, NewStockIn, StockIn};
use crate::store::{lock_raw_materials, settle, LedgerStore, LedgerTx};

/// Receiving service for stock-in batches
#[derive(Clone)]
pub struct ReceivingService<S> {
    store: S,
}

/// Rows written by one stock-in batch
#[derive(Debug, Clone, Serialize)]
pub struct StockInBatch {
    pub created: Vec<StockIn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedStockIn {
    pub id: Uuid,
}

impl<S: LedgerStore> ReceivingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Receive every line of a purchase invoice in one transaction
    pub async fn receive(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: CreateStockInInput,
    ) -> AppResult<StockInBatch> {
        input.validate_request()?;

        let mut tx = self.store.begin().await?;
        let outcome = receive_lines(&mut tx, business_id, user_id, &input).await;
        let batch = settle(tx, outcome).await?;

        tracing::info!(
            invoice_id = %input.invoice_id,
            lines = batch.created.len(),
            "Stock-in batch committed"
        );

        Ok(batch)
    }

    /// Delete a stock-in row. Raw material levels are left as they are.
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> AppResult<DeletedStockIn> {
        let mut tx = self.store.begin().await?;
        let outcome = delete_row(&mut tx, business_id, id).await;
        let deleted = settle(tx, outcome).await?;

        tracing::info!(stock_in_id = %id, "Stock-in deleted");

        Ok(deleted)
    }
}

/// A stock-in line with its invoice item and target raw material resolved
struct ResolvedLine<'a> {
    line: &'a StockInLine,
    item: InvoiceItemContext,
    raw_material_id: Uuid,
    received_date: NaiveDate,
    total_value: Decimal,
}

async fn receive_lines<T: LedgerTx>(
    tx: &mut T,
    business_id: Uuid,
    user_id: Uuid,
    input: &CreateStockInInput,
) -> AppResult<StockInBatch> {
    let mut resolved = Vec::with_capacity(input.items.len());
    for (index, line) in input.items.iter().enumerate() {
        resolved.push(resolve_line(tx, business_id, input, index, line).await?);
    }

    // Every line resolves to one outlet: the invoice's
    let Some(outlet_id) = resolved.first().map(|r| r.item.outlet_id) else {
        return Ok(StockInBatch {
            created: Vec::new(),
        });
    };
    let mut raw_materials = lock_raw_materials(
        tx,
        outlet_id,
        resolved.iter().map(|r| r.raw_material_id),
    )
    .await?;

    let mut created = Vec::with_capacity(resolved.len());
    for r in resolved {
        let stock_in = tx
            .insert_stock_in(NewStockIn {
                purchase_invoice_item_id: r.item.id,
                quantity_in: r.line.quantity_in,
                total_value: r.total_value,
                received_date: r.received_date,
                proof_images: r.line.images.clone(),
                created_by: user_id,
            })
            .await?;

        let raw_material = raw_materials
            .get_mut(&r.raw_material_id)
            .ok_or_else(|| AppError::NotFound("Raw material".to_string()))?;

        let levels = raw_material.levels().receive(r.line.quantity_in)?;
        tx.write_raw_material_levels(raw_material.id, &levels).await?;
        raw_material.apply_levels(&levels, Utc::now());

        tracing::debug!(
            raw_material_id = %raw_material.id,
            quantity_in = %r.line.quantity_in,
            remaining_stock = %levels.remaining_stock,
            "Raw material received"
        );

        created.push(stock_in);
    }

    Ok(StockInBatch { created })
}

async fn resolve_line<'a, T: LedgerTx>(
    tx: &mut T,
    business_id: Uuid,
    input: &CreateStockInInput,
    index: usize,
    line: &'a StockInLine,
) -> AppResult<ResolvedLine<'a>> {
    let item = tx
        .invoice_item_context(business_id, input.invoice_id, line.purchase_invoice_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase invoice item".to_string()))?;

    let received_date = line.received_date.ok_or_else(|| AppError::Validation {
        field: format!("items[{}].received_date", index),
        message: "Received date is required".to_string(),
    })?;

    let total_value = match line.total_value {
        Some(total_value) => total_value,
        None => line_total(line.quantity_in, item.price_per_unit)?,
    };

    let plan = lookup_plan(&line.hints(), item.id);
    let candidates = tx.raw_material_candidates(item.outlet_id, &plan).await?;
    let raw_material_id = resolve_raw_material(&plan, &candidates)
        .ok_or_else(|| AppError::NotFound("Raw material".to_string()))?;

    Ok(ResolvedLine {
        line,
        item,
        raw_material_id,
        received_date,
        total_value,
    })
}

async fn delete_row<T: LedgerTx>(tx: &mut T, business_id: Uuid, id: Uuid) -> AppResult<DeletedStockIn> {
    let row = tx
        .lock_stock_in(business_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock in".to_string()))?;

    tx.delete_stock_in(row.id).await?;

    Ok(DeletedStockIn { id: row.id })
}
