//! Stock rows: raw materials and finished goods

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{FinishedGoodLevels, RawMaterialLevels};
use sqlx::FromRow;
use uuid::Uuid;

/// An input good bought from suppliers and consumed by production
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RawMaterial {
    pub id: Uuid,
    pub outlet_id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub unit: String,
    pub opening_stock: Decimal,
    /// Most recent inbound batch
    pub stock_in: Option<Decimal>,
    /// Cumulative quantity consumed by production
    pub stock_in_production: Decimal,
    /// Authoritative on-hand balance
    pub remaining_stock: Decimal,
    pub price_per_unit: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RawMaterial {
    pub fn levels(&self) -> RawMaterialLevels {
        RawMaterialLevels {
            opening_stock: self.opening_stock,
            stock_in: self.stock_in,
            stock_in_production: self.stock_in_production,
            remaining_stock: self.remaining_stock,
        }
    }

    pub fn apply_levels(&mut self, levels: &RawMaterialLevels, at: DateTime<Utc>) {
        self.opening_stock = levels.opening_stock;
        self.stock_in = levels.stock_in;
        self.stock_in_production = levels.stock_in_production;
        self.remaining_stock = levels.remaining_stock;
        self.updated_at = at;
    }
}

/// An output good produced from raw materials
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FinishedGood {
    pub id: Uuid,
    pub outlet_id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub unit: String,
    /// Legacy mirror of `remaining_stock`
    pub initial_stock: Decimal,
    pub remaining_stock: Decimal,
    pub price_per_unit: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinishedGood {
    pub fn levels(&self) -> FinishedGoodLevels {
        FinishedGoodLevels {
            initial_stock: self.initial_stock,
            remaining_stock: self.remaining_stock,
        }
    }

    pub fn apply_levels(&mut self, levels: &FinishedGoodLevels, at: DateTime<Utc>) {
        self.initial_stock = levels.initial_stock;
        self.remaining_stock = levels.remaining_stock;
        self.updated_at = at;
    }
}

/// Finished good created by a `new` production run
#[derive(Debug, Clone)]
pub struct NewFinishedGood {
    pub outlet_id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub unit: String,
    pub levels: FinishedGoodLevels,
    pub price_per_unit: Decimal,
}

/// Purchase invoice line with the outlet it was billed to
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceItemContext {
    pub id: Uuid,
    pub purchase_invoice_id: Uuid,
    pub outlet_id: Uuid,
    pub price_per_unit: Decimal,
}
