//! Stock-out ledger rows

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One shipped finished good line
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockOut {
    pub id: Uuid,
    pub outlet_id: Uuid,
    pub finished_good_id: Uuid,
    pub quantity_out: Decimal,
    /// Groups the lines of one physical event
    pub stock_out_number: String,
    pub transaction_date: NaiveDate,
    pub proof_images: Vec<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStockOut {
    pub outlet_id: Uuid,
    pub finished_good_id: Uuid,
    pub quantity_out: Decimal,
    pub stock_out_number: String,
    pub transaction_date: NaiveDate,
    pub proof_images: Vec<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
}
