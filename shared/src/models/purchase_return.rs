//! Purchase return request models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{check, check_lines, FieldError, ValidateRequest};

/// Return received raw materials to the supplier
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePurchaseReturnInput {
    pub outlet_id: Uuid,
    pub purchase_invoice_id: Uuid,
    pub items: Vec<PurchaseReturnLine>,
    /// Generated when absent
    #[validate(custom = "crate::validation::document_number")]
    pub return_number: Option<String>,
    pub return_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

/// One returned raw material line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PurchaseReturnLine {
    /// Raw material id
    #[serde(alias = "raw_material_id", alias = "rawMaterialId")]
    #[validate(required(message = "Raw material is required"))]
    pub product_id: Option<Uuid>,
    #[validate(
        required(message = "Quantity is required"),
        custom = "crate::validation::positive_quantity"
    )]
    pub quantity: Option<Decimal>,
    /// Defaults to the raw material's price per unit
    #[serde(alias = "pricePerUnit")]
    #[validate(custom = "crate::validation::non_negative_amount")]
    pub price_per_unit: Option<Decimal>,
}

/// Body of the purchase return delete endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeletePurchaseReturnInput {
    pub id: Uuid,
}

/// A return line after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedReturnLine {
    pub raw_material_id: Uuid,
    pub quantity: Decimal,
    pub price_per_unit: Option<Decimal>,
}

impl PurchaseReturnLine {
    /// The line with its required fields unwrapped, if present
    pub fn validated(&self) -> Option<ValidatedReturnLine> {
        Some(ValidatedReturnLine {
            raw_material_id: self.product_id?,
            quantity: self.quantity?,
            price_per_unit: self.price_per_unit,
        })
    }
}

impl ValidateRequest for CreatePurchaseReturnInput {
    fn validate_request(&self) -> Result<(), FieldError> {
        check(None, self)?;
        check_lines("items", &self.items)
    }
}
