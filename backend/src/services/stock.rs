//! Stock listings for an outlet, with CSV export

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{FinishedGood, RawMaterial, StockOut};
use crate::store::LedgerStore;

/// Read-only stock queries. Nothing here takes a row lock.
#[derive(Clone)]
pub struct StockService<S> {
    store: S,
}

/// Flat raw material record for CSV export
#[derive(Debug, Serialize)]
pub struct RawMaterialRecord {
    pub id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub unit: String,
    pub opening_stock: Decimal,
    pub stock_in: Option<Decimal>,
    pub stock_in_production: Decimal,
    pub remaining_stock: Decimal,
    pub price_per_unit: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<&RawMaterial> for RawMaterialRecord {
    fn from(row: &RawMaterial) -> Self {
        Self {
            id: row.id,
            sku: row.sku.clone(),
            name: row.name.clone(),
            unit: row.unit.clone(),
            opening_stock: row.opening_stock,
            stock_in: row.stock_in,
            stock_in_production: row.stock_in_production,
            remaining_stock: row.remaining_stock,
            price_per_unit: row.price_per_unit,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinishedGoodRecord {
    pub id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub unit: String,
    pub remaining_stock: Decimal,
    pub price_per_unit: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<&FinishedGood> for FinishedGoodRecord {
    fn from(row: &FinishedGood) -> Self {
        Self {
            id: row.id,
            sku: row.sku.clone(),
            name: row.name.clone(),
            unit: row.unit.clone(),
            remaining_stock: row.remaining_stock,
            price_per_unit: row.price_per_unit,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockOutRecord {
    pub id: Uuid,
    pub stock_out_number: String,
    pub finished_good_id: Uuid,
    pub quantity_out: Decimal,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
}

impl From<&StockOut> for StockOutRecord {
    fn from(row: &StockOut) -> Self {
        Self {
            id: row.id,
            stock_out_number: row.stock_out_number.clone(),
            finished_good_id: row.finished_good_id,
            quantity_out: row.quantity_out,
            transaction_date: row.transaction_date,
            notes: row.notes.clone(),
        }
    }
}

impl<S: LedgerStore> StockService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn ensure_outlet(&self, business_id: Uuid, outlet_id: Uuid) -> AppResult<()> {
        if !self.store.outlet_exists(business_id, outlet_id).await? {
            return Err(AppError::NotFound("Outlet".to_string()));
        }
        Ok(())
    }

    pub async fn raw_materials(
        &self,
        business_id: Uuid,
        outlet_id: Uuid,
    ) -> AppResult<Vec<RawMaterial>> {
        self.ensure_outlet(business_id, outlet_id).await?;
        self.store.list_raw_materials(outlet_id).await
    }

    pub async fn finished_goods(
        &self,
        business_id: Uuid,
        outlet_id: Uuid,
    ) -> AppResult<Vec<FinishedGood>> {
        self.ensure_outlet(business_id, outlet_id).await?;
        self.store.list_finished_goods(outlet_id).await
    }

    pub async fn stock_outs(&self, business_id: Uuid, outlet_id: Uuid) -> AppResult<Vec<StockOut>> {
        self.ensure_outlet(business_id, outlet_id).await?;
        self.store.list_stock_outs(outlet_id).await
    }
}

/// Export records as CSV with a header row
pub fn export_to_csv<T: Serialize>(records: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_writes_header_and_rows() {
        let records = vec![StockOutRecord {
            id: Uuid::nil(),
            stock_out_number: "SO-1-1".to_string(),
            finished_good_id: Uuid::nil(),
            quantity_out: Decimal::new(25, 1),
            transaction_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            notes: None,
        }];

        let csv = export_to_csv(&records).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("id,stock_out_number,finished_good_id,quantity_out,transaction_date,notes")
        );
        assert_eq!(
            lines.next(),
            Some("00000000-0000-0000-0000-000000000000,SO-1-1,00000000-0000-0000-0000-000000000000,2.5,2024-05-01,")
        );
    }

    #[test]
    fn test_export_empty_is_empty() {
        assert_eq!(export_to_csv::<StockOutRecord>(&[]).unwrap(), "");
    }
}
