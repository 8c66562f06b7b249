//! Purchase return header and detail rows

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseReturn {
    pub id: Uuid,
    pub outlet_id: Uuid,
    pub purchase_invoice_id: Uuid,
    pub return_number: String,
    pub return_date: NaiveDate,
    pub reason: Option<String>,
    pub total_value: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseReturnDetail {
    pub id: Uuid,
    pub purchase_return_id: Uuid,
    pub raw_material_id: Uuid,
    pub quantity_returned: Decimal,
    pub unit_price_return: Decimal,
    pub total_value_return: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Purchase return with its lines
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReturnWithDetails {
    #[serde(flatten)]
    pub header: PurchaseReturn,
    pub details: Vec<PurchaseReturnDetail>,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseReturn {
    pub outlet_id: Uuid,
    pub purchase_invoice_id: Uuid,
    pub return_number: String,
    pub return_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseReturnDetail {
    pub purchase_return_id: Uuid,
    pub raw_material_id: Uuid,
    pub quantity_returned: Decimal,
    pub unit_price_return: Decimal,
    pub total_value_return: Decimal,
}
