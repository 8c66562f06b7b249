//! Persistence seam for the ledger engine
//!
//! A [`LedgerStore`] hands out [`LedgerTx`] units of work. Every locking read
//! and every write of a ledger operation goes through one `LedgerTx`, which is
//! committed or rolled back as a whole by [`settle`].

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{FinishedGoodLevels, LookupKey, RawMaterialCandidate, RawMaterialLevels};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    FinishedGood, InvoiceItemContext, NewFinishedGood, NewProductionMaterial, NewProductionRun,
    NewPurchaseReturn, NewPurchaseReturnDetail, NewStockIn, NewStockOut, ProductionMaterial,
    ProductionRun, ProductionRunDetail, PurchaseReturn, PurchaseReturnDetail,
    PurchaseReturnWithDetails, RawMaterial, StockIn, StockOut,
};

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryLedgerStore, MemoryLedgerTx, Step};
pub use postgres::{PgLedgerStore, PgLedgerTx};

/// Handle to the ledger database
#[async_trait]
pub trait LedgerStore: Clone + Send + Sync + 'static {
    type Tx: LedgerTx;

    /// Open a unit of work
    async fn begin(&self) -> AppResult<Self::Tx>;

    /// Round trip to the database
    async fn ping(&self) -> AppResult<()>;

    /// Whether the outlet exists and belongs to the business
    async fn outlet_exists(&self, business_id: Uuid, outlet_id: Uuid) -> AppResult<bool>;

    async fn list_raw_materials(&self, outlet_id: Uuid) -> AppResult<Vec<RawMaterial>>;

    async fn list_finished_goods(&self, outlet_id: Uuid) -> AppResult<Vec<FinishedGood>>;

    async fn list_stock_outs(&self, outlet_id: Uuid) -> AppResult<Vec<StockOut>>;

    async fn production_run(
        &self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<ProductionRunDetail>>;

    async fn purchase_return(
        &self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<PurchaseReturnWithDetails>>;
}

/// One open transaction. Methods named `lock_*` take a row lock that is held
/// until the transaction ends.
#[async_trait]
pub trait LedgerTx: Send + Sized {
    async fn outlet_in_business(&mut self, business_id: Uuid, outlet_id: Uuid) -> AppResult<bool>;

    // Raw materials

    async fn lock_raw_material(
        &mut self,
        outlet_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<RawMaterial>>;

    async fn write_raw_material_levels(
        &mut self,
        id: Uuid,
        levels: &RawMaterialLevels,
    ) -> AppResult<()>;

    /// Raw materials of the outlet matching any key of `plan`
    async fn raw_material_candidates(
        &mut self,
        outlet_id: Uuid,
        plan: &[LookupKey],
    ) -> AppResult<Vec<RawMaterialCandidate>>;

    // Finished goods

    async fn lock_finished_good(
        &mut self,
        outlet_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<FinishedGood>>;

    async fn write_finished_good_levels(
        &mut self,
        id: Uuid,
        levels: &FinishedGoodLevels,
    ) -> AppResult<()>;

    async fn insert_finished_good(&mut self, input: NewFinishedGood) -> AppResult<FinishedGood>;

    // Receiving

    /// Invoice item of `invoice_id`, visible to the business
    async fn invoice_item_context(
        &mut self,
        business_id: Uuid,
        invoice_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Option<InvoiceItemContext>>;

    async fn insert_stock_in(&mut self, input: NewStockIn) -> AppResult<StockIn>;

    async fn lock_stock_in(&mut self, business_id: Uuid, id: Uuid) -> AppResult<Option<StockIn>>;

    async fn delete_stock_in(&mut self, id: Uuid) -> AppResult<()>;

    // Stock-out

    async fn insert_stock_out(&mut self, input: NewStockOut) -> AppResult<StockOut>;

    async fn lock_stock_out(&mut self, business_id: Uuid, id: Uuid) -> AppResult<Option<StockOut>>;

    async fn delete_stock_out(&mut self, id: Uuid) -> AppResult<()>;

    // Production

    async fn insert_production_run(&mut self, input: NewProductionRun) -> AppResult<ProductionRun>;

    async fn insert_production_material(
        &mut self,
        input: NewProductionMaterial,
    ) -> AppResult<ProductionMaterial>;

    // Purchase returns

    async fn purchase_invoice_in_outlet(
        &mut self,
        outlet_id: Uuid,
        invoice_id: Uuid,
    ) -> AppResult<bool>;

    async fn insert_purchase_return(&mut self, input: NewPurchaseReturn)
        -> AppResult<PurchaseReturn>;

    async fn insert_purchase_return_detail(
        &mut self,
        input: NewPurchaseReturnDetail,
    ) -> AppResult<PurchaseReturnDetail>;

    async fn set_purchase_return_total(&mut self, id: Uuid, total_value: Decimal) -> AppResult<()>;

    async fn lock_purchase_return(
        &mut self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<PurchaseReturn>>;

    async fn purchase_return_details(&mut self, id: Uuid) -> AppResult<Vec<PurchaseReturnDetail>>;

    /// Delete the header and its details
    async fn delete_purchase_return(&mut self, id: Uuid) -> AppResult<()>;

    async fn commit(self) -> AppResult<()>;

    async fn rollback(self) -> AppResult<()>;
}

/// Commit `tx` when `outcome` succeeded, roll it back otherwise.
///
/// The original error is returned even when the rollback itself fails.
pub async fn settle<T, X: LedgerTx>(tx: X, outcome: AppResult<T>) -> AppResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// Lock every distinct raw material in `ids`, in ascending id order.
///
/// Concurrent operations touching overlapping rows then acquire them in the
/// same order. Ids with no row in the outlet are left out of the map.
pub async fn lock_raw_materials<X, I>(
    tx: &mut X,
    outlet_id: Uuid,
    ids: I,
) -> AppResult<BTreeMap<Uuid, RawMaterial>>
where
    X: LedgerTx,
    I: IntoIterator<Item = Uuid>,
{
    let ids: BTreeSet<Uuid> = ids.into_iter().collect();
    let mut locked = BTreeMap::new();
    for id in ids {
        if let Some(row) = tx.lock_raw_material(outlet_id, id).await? {
            locked.insert(id, row);
        }
    }
    Ok(locked)
}

/// Finished good counterpart of [`lock_raw_materials`]
pub async fn lock_finished_goods<X, I>(
    tx: &mut X,
    outlet_id: Uuid,
    ids: I,
) -> AppResult<BTreeMap<Uuid, FinishedGood>>
where
    X: LedgerTx,
    I: IntoIterator<Item = Uuid>,
{
    let ids: BTreeSet<Uuid> = ids.into_iter().collect();
    let mut locked = BTreeMap::new();
    for id in ids {
        if let Some(row) = tx.lock_finished_good(outlet_id, id).await? {
            locked.insert(id, row);
        }
    }
    Ok(locked)
}
