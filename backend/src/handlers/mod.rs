//! HTTP handlers

pub mod health;
pub mod production;
pub mod purchase_return;
pub mod stock;
pub mod stock_in;
pub mod stock_out;

pub use health::health_check;
pub use production::{create_production, get_production};
pub use purchase_return::{create_purchase_return, delete_purchase_return, get_purchase_return};
pub use stock::{list_finished_goods, list_raw_materials, list_stock_outs};
pub use stock_in::{create_stock_in, delete_stock_in};
pub use stock_out::{create_stock_out, delete_stock_out};
