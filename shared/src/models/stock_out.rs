//! Stock-out request models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{check, check_lines, FieldError, ValidateRequest};

/// Ship finished goods out of an outlet
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateStockOutInput {
    pub outlet_id: Uuid,
    pub items: Vec<StockOutLine>,
    /// Groups the lines into one physical event; generated when absent
    #[validate(custom = "crate::validation::document_number")]
    pub stock_out_number: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StockOutLine {
    #[serde(alias = "finishedGoodId")]
    pub finished_good_id: Uuid,
    #[serde(alias = "quantityOut")]
    #[validate(custom = "crate::validation::positive_quantity")]
    pub quantity_out: Decimal,
}

impl ValidateRequest for CreateStockOutInput {
    fn validate_request(&self) -> Result<(), FieldError> {
        check(None, self)?;
        check_lines("items", &self.items)
    }
}
