//! Shared types and models for the Stock Ledger platform
//!
//! This crate contains the request schemas, the pure stock arithmetic and the
//! validation rules shared between the backend and the WASM bindings.

pub mod ledger;
pub mod models;
pub mod resolution;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use resolution::*;
pub use types::*;
pub use validation::*;
