//! Production service: raw materials in, finished goods out

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    production_cost, unit_cost, CreateProductionInput, FinishedGoodLevels, ValidateRequest,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewFinishedGood, NewProductionMaterial, NewProductionRun, ProductionRunDetail};
use crate::store::{lock_raw_materials, settle, LedgerStore, LedgerTx};

/// Production service for recording runs
#[derive(Clone)]
pub struct ProductionService<S> {
    store: S,
}

/// Outcome of a committed production run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionReceipt {
    pub production_run_id: Uuid,
    pub finished_good_id: Uuid,
    pub total_cost: Decimal,
    pub price_per_unit: Decimal,
}

impl<S: LedgerStore> ProductionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a production run.
    ///
    /// The output finished good is created or incremented, then every material
    /// line is consumed. Consumption floors a raw material at zero.
    pub async fn produce(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: CreateProductionInput,
    ) -> AppResult<ProductionReceipt> {
        input.validate_request()?;

        let mut tx = self.store.begin().await?;
        let outcome = record_run(&mut tx, business_id, user_id, &input).await;
        let receipt = settle(tx, outcome).await?;

        tracing::info!(
            production_run_id = %receipt.production_run_id,
            production_type = %input.production_type(),
            total_cost = %receipt.total_cost,
            "Production run committed"
        );

        Ok(receipt)
    }

    /// Get a production run with its bill of materials
    pub async fn get_run(&self, business_id: Uuid, id: Uuid) -> AppResult<ProductionRunDetail> {
        self.store
            .production_run(business_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Production run".to_string()))
    }
}

async fn record_run<T: LedgerTx>(
    tx: &mut T,
    business_id: Uuid,
    user_id: Uuid,
    input: &CreateProductionInput,
) -> AppResult<ProductionReceipt> {
    let outlet_id = input.outlet_id();
    if !tx.outlet_in_business(business_id, outlet_id).await? {
        return Err(AppError::NotFound("Outlet".to_string()));
    }

    let amount = input.finished_amount();
    let total_cost = production_cost(input.cost_lines())?;
    let price_per_unit = unit_cost(total_cost, amount)?;

    let finished_good_id = match input {
        CreateProductionInput::New(new) => {
            let good = tx
                .insert_finished_good(NewFinishedGood {
                    outlet_id,
                    sku: new.finished_sku.clone(),
                    name: new.finished_name.trim().to_string(),
                    unit: new.finished_unit.clone(),
                    levels: FinishedGoodLevels::produced(amount),
                    price_per_unit,
                })
                .await?;
            good.id
        }
        CreateProductionInput::Existed(existed) => {
            let good = tx
                .lock_finished_good(outlet_id, existed.finished_good_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Finished good".to_string()))?;
            let levels = good.levels().produce(amount)?;
            tx.write_finished_good_levels(good.id, &levels).await?;
            good.id
        }
    };

    let run = tx
        .insert_production_run(NewProductionRun {
            outlet_id,
            finished_good_id,
            quantity_produced: amount,
            production_type: input.production_type(),
            total_cost,
            created_by: user_id,
        })
        .await?;

    let mut raw_materials = lock_raw_materials(
        tx,
        outlet_id,
        input.products().iter().map(|line| line.raw_material_id),
    )
    .await?;

    for line in input.products() {
        tx.insert_production_material(NewProductionMaterial {
            production_run_id: run.id,
            raw_material_id: line.raw_material_id,
            quantity_used: line.quantity_used,
            price_per_unit: line.price_per_unit,
        })
        .await?;

        let raw_material = raw_materials
            .get_mut(&line.raw_material_id)
            .ok_or_else(|| AppError::NotFound("Raw material".to_string()))?;

        let (levels, adjustment) = raw_material.levels().consume(line.quantity_used)?;
        if adjustment.clamped {
            tracing::debug!(
                raw_material_id = %raw_material.id,
                quantity_used = %line.quantity_used,
                available = %adjustment.before,
                "Consumption floored at zero"
            );
        }
        tx.write_raw_material_levels(raw_material.id, &levels).await?;
        raw_material.apply_levels(&levels, Utc::now());
    }

    Ok(ProductionReceipt {
        production_run_id: run.id,
        finished_good_id,
        total_cost,
        price_per_unit,
    })
}
