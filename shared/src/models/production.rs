//! Production run request models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::types::ProductionType;
use crate::validation::{check, check_lines, FieldError, ValidateRequest};

/// Record a production run, tagged by `productionType`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "productionType", rename_all = "lowercase")]
pub enum CreateProductionInput {
    /// Output becomes a new finished good
    New(NewProductionInput),
    /// Output is added to an existing finished good
    Existed(ExistedProductionInput),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProductionInput {
    pub outlet_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Finished good name is required"))]
    pub finished_name: String,
    #[validate(length(max = 100))]
    pub finished_sku: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Finished good unit is required"))]
    pub finished_unit: String,
    #[validate(custom = "crate::validation::non_negative_quantity")]
    pub finished_amount: Decimal,
    pub products: Vec<ProductionMaterialLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExistedProductionInput {
    pub outlet_id: Uuid,
    pub finished_good_id: Uuid,
    #[validate(custom = "crate::validation::non_negative_quantity")]
    pub finished_amount: Decimal,
    pub products: Vec<ProductionMaterialLine>,
}

/// One raw material consumed by a run
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProductionMaterialLine {
    #[serde(alias = "rawMaterialId")]
    pub raw_material_id: Uuid,
    #[serde(alias = "quantityUsed")]
    #[validate(custom = "crate::validation::positive_quantity")]
    pub quantity_used: Decimal,
    #[serde(alias = "pricePerUnit")]
    #[validate(custom = "crate::validation::non_negative_amount")]
    pub price_per_unit: Decimal,
}

impl CreateProductionInput {
    pub fn production_type(&self) -> ProductionType {
        match self {
            CreateProductionInput::New(_) => ProductionType::New,
            CreateProductionInput::Existed(_) => ProductionType::Existed,
        }
    }

    pub fn outlet_id(&self) -> Uuid {
        match self {
            CreateProductionInput::New(input) => input.outlet_id,
            CreateProductionInput::Existed(input) => input.outlet_id,
        }
    }

    pub fn finished_amount(&self) -> Decimal {
        match self {
            CreateProductionInput::New(input) => input.finished_amount,
            CreateProductionInput::Existed(input) => input.finished_amount,
        }
    }

    pub fn products(&self) -> &[ProductionMaterialLine] {
        match self {
            CreateProductionInput::New(input) => &input.products,
            CreateProductionInput::Existed(input) => &input.products,
        }
    }

    /// `(quantity_used, price_per_unit)` pairs for costing
    pub fn cost_lines(&self) -> impl Iterator<Item = (Decimal, Decimal)> + '_ {
        self.products()
            .iter()
            .map(|line| (line.quantity_used, line.price_per_unit))
    }
}

impl ValidateRequest for CreateProductionInput {
    fn validate_request(&self) -> Result<(), FieldError> {
        match self {
            CreateProductionInput::New(input) => check(None, input)?,
            CreateProductionInput::Existed(input) => check(None, input)?,
        }
        check_lines("products", self.products())
    }
}
