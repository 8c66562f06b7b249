//! WebAssembly module for the Stock Ledger platform
//!
//! Provides client-side previews for:
//! - Production costing
//! - Stock-out availability
//! - Purchase return line totals
//! - Stock-in balances and document numbers

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    line_total, production_cost, stock_out_number, unit_cost, FinishedGoodLevels,
    RawMaterialLevels,
};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductionPreviewInput {
    finished_amount: Decimal,
    products: Vec<CostLine>,
}

#[derive(Debug, Deserialize)]
struct CostLine {
    #[serde(alias = "quantityUsed")]
    quantity_used: Decimal,
    #[serde(alias = "pricePerUnit")]
    price_per_unit: Decimal,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ProductionPreview {
    total_cost: Decimal,
    price_per_unit: Decimal,
}

fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

fn fail(message: String) -> JsValue {
    warn(&message);
    JsValue::from_str(&message)
}

fn parse_decimal(value: &str) -> Result<Decimal, String> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("Invalid decimal '{}': {}", value, e))
}

fn production_preview(input_json: &str) -> Result<ProductionPreview, String> {
    let input: ProductionPreviewInput = serde_json::from_str(input_json)
        .map_err(|e| format!("Invalid production JSON: {}", e))?;

    let total_cost = production_cost(
        input
            .products
            .iter()
            .map(|line| (line.quantity_used, line.price_per_unit)),
    )
    .map_err(|e| e.to_string())?;

    Ok(ProductionPreview {
        total_cost,
        price_per_unit: unit_cost(total_cost, input.finished_amount).map_err(|e| e.to_string())?,
    })
}

fn stock_in_remaining(levels_json: &str, quantity_in: &str) -> Result<Decimal, String> {
    let levels: RawMaterialLevels = serde_json::from_str(levels_json)
        .map_err(|e| format!("Invalid levels JSON: {}", e))?;
    levels
        .receive(parse_decimal(quantity_in)?)
        .map(|levels| levels.remaining_stock)
        .map_err(|e| e.to_string())
}

/// Preview total cost and unit price of a production run.
///
/// Input: `{"finishedAmount": "10", "products": [{"quantity_used": "2", "price_per_unit": "1000"}]}`
#[wasm_bindgen]
pub fn preview_production_cost(input_json: &str) -> Result<String, JsValue> {
    let preview = production_preview(input_json).map_err(fail)?;
    serde_json::to_string(&preview).map_err(|e| fail(e.to_string()))
}

/// Whether a finished good with `remaining` can ship `quantity_out`
#[wasm_bindgen]
pub fn can_stock_out(remaining: &str, quantity_out: &str) -> bool {
    match (parse_decimal(remaining), parse_decimal(quantity_out)) {
        (Ok(remaining), Ok(quantity_out)) => FinishedGoodLevels {
            initial_stock: remaining,
            remaining_stock: remaining,
        }
        .ship(quantity_out)
        .is_ok(),
        _ => {
            warn("can_stock_out: invalid quantity");
            false
        }
    }
}

/// Total of a purchase return line, rounded to cents
#[wasm_bindgen]
pub fn return_line_total(quantity: &str, unit_price: &str) -> Result<String, JsValue> {
    let quantity = parse_decimal(quantity).map_err(fail)?;
    let unit_price = parse_decimal(unit_price).map_err(fail)?;
    line_total(quantity, unit_price)
        .map(|total| total.to_string())
        .map_err(|e| fail(e.to_string()))
}

/// Remaining stock of a raw material after receiving `quantity_in`
#[wasm_bindgen]
pub fn preview_stock_in_remaining(levels_json: &str, quantity_in: &str) -> Result<String, JsValue> {
    stock_in_remaining(levels_json, quantity_in)
        .map(|remaining| remaining.to_string())
        .map_err(fail)
}

/// Default stock-out number for an outlet at the current time
#[wasm_bindgen]
pub fn preview_stock_out_number(outlet_id: &str) -> String {
    stock_out_number(outlet_id, js_sys::Date::now() as i64)
}
