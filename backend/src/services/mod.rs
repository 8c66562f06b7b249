//! Business logic services for the Stock Ledger platform
//!
//! Every service is generic over the [`LedgerStore`](crate::store::LedgerStore)
//! it runs against.

pub mod production;
pub mod purchase_return;
pub mod receiving;
pub mod stock;
pub mod stock_out;

pub use production::ProductionService;
pub use purchase_return::PurchaseReturnService;
pub use receiving::ReceivingService;
pub use stock::StockService;
pub use stock_out::StockOutService;
