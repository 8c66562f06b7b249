//! Production run and bill-of-materials rows

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductionRun {
    pub id: Uuid,
    pub outlet_id: Uuid,
    pub finished_good_id: Uuid,
    pub quantity_produced: Decimal,
    pub production_type: String,
    pub total_cost: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Raw material consumed by a run
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductionMaterial {
    pub id: Uuid,
    pub production_run_id: Uuid,
    pub raw_material_id: Uuid,
    pub quantity_used: Decimal,
    pub price_per_unit: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Production run with its bill of materials
#[derive(Debug, Clone, Serialize)]
pub struct ProductionRunDetail {
    #[serde(flatten)]
    pub run: ProductionRun,
    pub materials: Vec<ProductionMaterial>,
}

#[derive(Debug, Clone)]
pub struct NewProductionRun {
    pub outlet_id: Uuid,
    pub finished_good_id: Uuid,
    pub quantity_produced: Decimal,
    pub production_type: shared::ProductionType,
    pub total_cost: Decimal,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewProductionMaterial {
    pub production_run_id: Uuid,
    pub raw_material_id: Uuid,
    pub quantity_used: Decimal,
    pub price_per_unit: Decimal,
}
