//! Shared fixtures for ledger integration tests

#![allow(dead_code)]

use std::str::FromStr;

use rust_decimal::Decimal;
use shared::RawMaterialLevels;
use stock_ledger_backend::MemoryLedgerStore;
use uuid::Uuid;

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Raw material levels with a consistent `remaining_stock`
pub fn levels(opening: &str, stock_in: Option<&str>, remaining: &str) -> RawMaterialLevels {
    RawMaterialLevels {
        opening_stock: dec(opening),
        stock_in: stock_in.map(dec),
        stock_in_production: Decimal::ZERO,
        remaining_stock: dec(remaining),
    }
}

/// One tenant with one outlet in a fresh memory store
pub struct Fixture {
    pub store: MemoryLedgerStore,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub outlet_id: Uuid,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = MemoryLedgerStore::new();
        let business_id = Uuid::new_v4();
        let outlet_id = store.add_outlet(business_id).await;
        Self {
            store,
            business_id,
            user_id: Uuid::new_v4(),
            outlet_id,
        }
    }

    pub async fn raw_material(&self, name: &str, levels: RawMaterialLevels, price: &str) -> Uuid {
        self.store
            .add_raw_material(self.outlet_id, name, None, levels, dec(price))
            .await
    }

    pub async fn raw_material_with_sku(
        &self,
        name: &str,
        sku: &str,
        levels: RawMaterialLevels,
    ) -> Uuid {
        self.store
            .add_raw_material(self.outlet_id, name, Some(sku), levels, Decimal::ZERO)
            .await
    }

    pub async fn finished_good(&self, name: &str, remaining: &str) -> Uuid {
        self.store
            .add_finished_good(self.outlet_id, name, dec(remaining))
            .await
    }

    /// Purchase invoice with one line for `raw_material_id`
    pub async fn invoice_item(&self, raw_material_id: Option<Uuid>, price: &str) -> (Uuid, Uuid) {
        let invoice_id = self.store.add_invoice(self.outlet_id).await;
        let item_id = self
            .store
            .add_invoice_item(invoice_id, raw_material_id, dec(price))
            .await;
        (invoice_id, item_id)
    }

    pub async fn remaining_raw(&self, id: Uuid) -> Decimal {
        self.store.raw_material(id).await.unwrap().remaining_stock
    }

    pub async fn remaining_finished(&self, id: Uuid) -> Decimal {
        self.store.finished_good(id).await.unwrap().remaining_stock
    }
}
