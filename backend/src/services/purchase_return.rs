//! Purchase return service: received raw materials sent back to the supplier

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    add_amount, line_total, return_number, CreatePurchaseReturnInput, OverReturnWarning, ValidateRequest,
    ValidatedReturnLine,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewPurchaseReturn, NewPurchaseReturnDetail, PurchaseReturnWithDetails};
use crate::store::{lock_raw_materials, settle, LedgerStore, LedgerTx};

/// Purchase return service
#[derive(Clone)]
pub struct PurchaseReturnService<S> {
    store: S,
}

/// Outcome of a committed purchase return
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReturnReceipt {
    pub purchase_return_id: Uuid,
    pub return_number: String,
    pub total_value: Decimal,
    /// Lines that left a raw material below zero
    pub warnings: Vec<OverReturnWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedPurchaseReturn {
    pub message: String,
}

impl<S: LedgerStore> PurchaseReturnService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a purchase return. Stock is released without a floor.
    pub async fn create(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: CreatePurchaseReturnInput,
    ) -> AppResult<PurchaseReturnReceipt> {
        input.validate_request()?;

        let mut lines = Vec::with_capacity(input.items.len());
        for (index, item) in input.items.iter().enumerate() {
            let line = item.validated().ok_or_else(|| AppError::Validation {
                field: format!("items[{}]", index),
                message: "Raw material and quantity are required".to_string(),
            })?;
            lines.push(line);
        }

        let mut tx = self.store.begin().await?;
        let outcome = release_lines(&mut tx, business_id, user_id, &input, &lines).await;
        let receipt = settle(tx, outcome).await?;

        tracing::info!(
            purchase_return_id = %receipt.purchase_return_id,
            return_number = %receipt.return_number,
            total_value = %receipt.total_value,
            "Purchase return committed"
        );

        Ok(receipt)
    }

    /// Get a purchase return with its lines
    pub async fn get(&self, business_id: Uuid, id: Uuid) -> AppResult<PurchaseReturnWithDetails> {
        self.store
            .purchase_return(business_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Purchase return".to_string()))
    }

    /// Delete a purchase return and restore every returned quantity
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> AppResult<DeletedPurchaseReturn> {
        let mut tx = self.store.begin().await?;
        let outcome = restore_lines(&mut tx, business_id, id).await;
        settle(tx, outcome).await?;

        tracing::info!(purchase_return_id = %id, "Purchase return reversed");

        Ok(DeletedPurchaseReturn {
            message: "Purchase return deleted".to_string(),
        })
    }
}

async fn release_lines<T: LedgerTx>(
    tx: &mut T,
    business_id: Uuid,
    user_id: Uuid,
    input: &CreatePurchaseReturnInput,
    lines: &[ValidatedReturnLine],
) -> AppResult<PurchaseReturnReceipt> {
    if !tx.outlet_in_business(business_id, input.outlet_id).await? {
        return Err(AppError::NotFound("Outlet".to_string()));
    }
    if !tx
        .purchase_invoice_in_outlet(input.outlet_id, input.purchase_invoice_id)
        .await?
    {
        return Err(AppError::NotFound("Purchase invoice".to_string()));
    }

    let now = Utc::now();
    let header = tx
        .insert_purchase_return(NewPurchaseReturn {
            outlet_id: input.outlet_id,
            purchase_invoice_id: input.purchase_invoice_id,
            return_number: input
                .return_number
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or_else(|| return_number(now.timestamp_millis())),
            return_date: input.return_date.unwrap_or_else(|| now.date_naive()),
            reason: input.reason.clone(),
            created_by: user_id,
        })
        .await?;

    let mut total_value = Decimal::ZERO;
    let mut warnings = Vec::new();
    let mut raw_materials = lock_raw_materials(
        tx,
        input.outlet_id,
        lines.iter().map(|line| line.raw_material_id),
    )
    .await?;

    for line in lines {
        let raw_material = raw_materials
            .get_mut(&line.raw_material_id)
            .ok_or_else(|| AppError::ReferenceNotFound("Raw material".to_string()))?;

        let unit_price = line.price_per_unit.unwrap_or(raw_material.price_per_unit);
        let line_value = line_total(line.quantity, unit_price)?;

        tx.insert_purchase_return_detail(NewPurchaseReturnDetail {
            purchase_return_id: header.id,
            raw_material_id: raw_material.id,
            quantity_returned: line.quantity,
            unit_price_return: unit_price,
            total_value_return: line_value,
        })
        .await?;

        let (levels, adjustment) = raw_material.levels().release_return(line.quantity)?;
        tx.write_raw_material_levels(raw_material.id, &levels).await?;
        raw_material.apply_levels(&levels, now);

        if adjustment.is_negative() {
            tracing::warn!(
                raw_material_id = %raw_material.id,
                quantity_returned = %line.quantity,
                remaining_stock = %adjustment.after,
                "Purchase return left raw material below zero"
            );
            warnings.push(OverReturnWarning::new(
                raw_material.id,
                line.quantity,
                adjustment.after,
            ));
        }

        total_value = add_amount(total_value, line_value)?;
    }

    tx.set_purchase_return_total(header.id, total_value).await?;

    Ok(PurchaseReturnReceipt {
        purchase_return_id: header.id,
        return_number: header.return_number,
        total_value,
        warnings,
    })
}

async fn restore_lines<T: LedgerTx>(tx: &mut T, business_id: Uuid, id: Uuid) -> AppResult<()> {
    let header = tx
        .lock_purchase_return(business_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase return".to_string()))?;

    let details = tx.purchase_return_details(header.id).await?;
    let mut raw_materials = lock_raw_materials(
        tx,
        header.outlet_id,
        details.iter().map(|detail| detail.raw_material_id),
    )
    .await?;

    let now = Utc::now();
    for detail in &details {
        let raw_material = raw_materials
            .get_mut(&detail.raw_material_id)
            .ok_or_else(|| AppError::NotFound("Raw material".to_string()))?;

        let levels = raw_material.levels().restore_return(detail.quantity_returned)?;
        tx.write_raw_material_levels(raw_material.id, &levels).await?;
        raw_material.apply_levels(&levels, now);
    }

    tx.delete_purchase_return(header.id).await?;

    Ok(())
}
