//! Database models for the Stock Ledger platform
//!
//! Re-exports request models from the shared crate and adds the persisted
//! stock and ledger rows.

mod production;
mod purchase_return;
mod stock;
mod stock_in;
mod stock_out;

pub use production::*;
pub use purchase_return::*;
pub use shared::models::*;
pub use stock::*;
pub use stock_in::*;
pub use stock_out::*;
