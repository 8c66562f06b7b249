//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Branch of a production run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionType {
    /// Output is a newly created finished good
    New,
    /// Output is added to an existing finished good
    Existed,
}

impl ProductionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionType::New => "new",
            ProductionType::Existed => "existed",
        }
    }
}

impl std::fmt::Display for ProductionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchase return line that left a raw material below zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverReturnWarning {
    pub code: String,
    pub raw_material_id: Uuid,
    pub quantity_returned: Decimal,
    pub remaining_stock: Decimal,
}

impl OverReturnWarning {
    pub const CODE: &'static str = "over_return";

    pub fn new(raw_material_id: Uuid, quantity_returned: Decimal, remaining_stock: Decimal) -> Self {
        Self {
            code: Self::CODE.to_string(),
            raw_material_id,
            quantity_returned,
            remaining_stock,
        }
    }
}
