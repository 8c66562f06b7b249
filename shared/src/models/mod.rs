//! Request schemas for the stock ledger operations
//!
//! Every schema rejects unknown fields so malformed payloads never reach the
//! database. Top-level keys are camelCase; line keys are snake_case.

mod production;
mod purchase_return;
mod stock_in;
mod stock_out;

pub use production::*;
pub use purchase_return::*;
pub use stock_in::*;
pub use stock_out::*;
