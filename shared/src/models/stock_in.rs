//! Stock-in (receiving) request models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::resolution::RawMaterialHints;
use crate::validation::{check_lines, FieldError, ValidateRequest};

/// Receive invoice lines into raw material stock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateStockInInput {
    pub invoice_id: Uuid,
    pub items: Vec<StockInLine>,
}

/// One received purchase invoice line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StockInLine {
    pub purchase_invoice_item_id: Uuid,
    #[validate(custom = "crate::validation::positive_quantity")]
    pub quantity_in: Decimal,
    /// Defaults to quantity × invoice item price
    #[validate(custom = "crate::validation::non_negative_amount")]
    pub total_value: Option<Decimal>,
    #[validate(required(message = "Received date is required"))]
    pub received_date: Option<NaiveDate>,
    pub raw_material_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub raw_material_name: Option<String>,
    #[validate(length(max = 100))]
    pub sku: Option<String>,
    /// Proof image references
    #[serde(default)]
    pub images: Vec<String>,
}

impl StockInLine {
    pub fn hints(&self) -> RawMaterialHints<'_> {
        RawMaterialHints {
            raw_material_id: self.raw_material_id,
            name: self.raw_material_name.as_deref(),
            sku: self.sku.as_deref(),
        }
    }
}

impl ValidateRequest for CreateStockInInput {
    fn validate_request(&self) -> Result<(), FieldError> {
        check_lines("items", &self.items)
    }
}
