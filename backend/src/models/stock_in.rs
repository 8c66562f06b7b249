//! Stock-in ledger rows

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One received purchase invoice line
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockIn {
    pub id: Uuid,
    pub purchase_invoice_item_id: Uuid,
    pub quantity_in: Decimal,
    pub total_value: Decimal,
    pub received_date: NaiveDate,
    pub proof_images: Vec<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStockIn {
    pub purchase_invoice_item_id: Uuid,
    pub quantity_in: Decimal,
    pub total_value: Decimal,
    pub received_date: NaiveDate,
    pub proof_images: Vec<String>,
    pub created_by: Uuid,
}
