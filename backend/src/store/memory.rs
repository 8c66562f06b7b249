//! In-memory ledger store
//!
//! Holds the whole ledger behind one async mutex. A transaction owns the
//! guard for its lifetime, so writers serialize the same way they do on
//! PostgreSQL row locks, and works on a staged copy that replaces the live
//! data only on commit. Dropping a transaction discards its staged copy.
//!
//! Faults can be injected on the n-th call of a [`Step`] to exercise rollback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::{FinishedGoodLevels, LookupKey, RawMaterialCandidate, RawMaterialLevels};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{LedgerStore, LedgerTx};
use crate::error::{AppError, AppResult};
use crate::models::{
    FinishedGood, InvoiceItemContext, NewFinishedGood, NewProductionMaterial, NewProductionRun,
    NewPurchaseReturn, NewPurchaseReturnDetail, NewStockIn, NewStockOut, ProductionMaterial,
    ProductionRun, ProductionRunDetail, PurchaseReturn, PurchaseReturnDetail,
    PurchaseReturnWithDetails, RawMaterial, StockIn, StockOut,
};

/// Write steps that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    WriteRawMaterial,
    WriteFinishedGood,
    InsertFinishedGood,
    InsertStockIn,
    DeleteStockIn,
    InsertStockOut,
    DeleteStockOut,
    InsertProductionRun,
    InsertProductionMaterial,
    InsertPurchaseReturn,
    InsertPurchaseReturnDetail,
    SetPurchaseReturnTotal,
    DeletePurchaseReturn,
    Commit,
}

#[derive(Debug, Clone)]
struct Outlet {
    id: Uuid,
    business_id: Uuid,
}

#[derive(Debug, Clone)]
struct Invoice {
    id: Uuid,
    outlet_id: Uuid,
}

#[derive(Debug, Clone)]
struct InvoiceItem {
    id: Uuid,
    invoice_id: Uuid,
    raw_material_id: Option<Uuid>,
    price_per_unit: Decimal,
}

#[derive(Debug, Clone, Default)]
struct LedgerData {
    outlets: Vec<Outlet>,
    invoices: Vec<Invoice>,
    invoice_items: Vec<InvoiceItem>,
    raw_materials: Vec<RawMaterial>,
    finished_goods: Vec<FinishedGood>,
    stock_ins: Vec<StockIn>,
    stock_outs: Vec<StockOut>,
    production_runs: Vec<ProductionRun>,
    production_materials: Vec<ProductionMaterial>,
    purchase_returns: Vec<PurchaseReturn>,
    purchase_return_details: Vec<PurchaseReturnDetail>,
}

impl LedgerData {
    fn outlet_business(&self, outlet_id: Uuid) -> Option<Uuid> {
        self.outlets
            .iter()
            .find(|o| o.id == outlet_id)
            .map(|o| o.business_id)
    }

    fn outlet_in_business(&self, business_id: Uuid, outlet_id: Uuid) -> bool {
        self.outlet_business(outlet_id) == Some(business_id)
    }

    fn invoice_outlet(&self, invoice_id: Uuid) -> Option<Uuid> {
        self.invoices
            .iter()
            .find(|i| i.id == invoice_id)
            .map(|i| i.outlet_id)
    }
}

#[derive(Debug, Default)]
struct Fault {
    remaining: HashMap<Step, usize>,
}

impl Fault {
    /// Count a call of `step`, failing when its countdown reaches zero
    fn hit(&mut self, step: Step) -> AppResult<()> {
        let Some(left) = self.remaining.get_mut(&step) else {
            return Ok(());
        };
        *left -= 1;
        if *left == 0 {
            self.remaining.remove(&step);
            return Err(AppError::DatabaseError(sqlx::Error::Protocol(format!(
                "injected failure at {:?}",
                step
            ))));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    data: LedgerData,
    faults: Fault,
    /// Ids passed to `lock_*` row reads, in call order. Never rolled back.
    lock_log: Vec<Uuid>,
}

/// Ledger store kept in process memory
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

/// Transaction over a [`MemoryLedgerStore`]
pub struct MemoryLedgerTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: LedgerData,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `nth` (1-based) call of `step`
    pub async fn fail_on(&self, step: Step, nth: usize) {
        let mut state = self.state.lock().await;
        state.faults.remaining.insert(step, nth.max(1));
    }

    pub async fn add_outlet(&self, business_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.lock().await;
        state.data.outlets.push(Outlet { id, business_id });
        id
    }

    pub async fn add_raw_material(
        &self,
        outlet_id: Uuid,
        name: &str,
        sku: Option<&str>,
        levels: RawMaterialLevels,
        price_per_unit: Decimal,
    ) -> Uuid {
        let now = Utc::now();
        let row = RawMaterial {
            id: Uuid::new_v4(),
            outlet_id,
            sku: sku.map(str::to_string),
            name: name.to_string(),
            unit: "kg".to_string(),
            opening_stock: levels.opening_stock,
            stock_in: levels.stock_in,
            stock_in_production: levels.stock_in_production,
            remaining_stock: levels.remaining_stock,
            price_per_unit,
            created_at: now,
            updated_at: now,
        };
        let id = row.id;
        self.state.lock().await.data.raw_materials.push(row);
        id
    }

    pub async fn add_finished_good(
        &self,
        outlet_id: Uuid,
        name: &str,
        remaining_stock: Decimal,
    ) -> Uuid {
        let now = Utc::now();
        let row = FinishedGood {
            id: Uuid::new_v4(),
            outlet_id,
            sku: None,
            name: name.to_string(),
            unit: "pcs".to_string(),
            initial_stock: remaining_stock,
            remaining_stock,
            price_per_unit: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        let id = row.id;
        self.state.lock().await.data.finished_goods.push(row);
        id
    }

    /// Add a purchase invoice to the outlet
    pub async fn add_invoice(&self, outlet_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .lock()
            .await
            .data
            .invoices
            .push(Invoice { id, outlet_id });
        id
    }

    /// Add an invoice line whose order detail points at `raw_material_id`
    pub async fn add_invoice_item(
        &self,
        invoice_id: Uuid,
        raw_material_id: Option<Uuid>,
        price_per_unit: Decimal,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().await.data.invoice_items.push(InvoiceItem {
            id,
            invoice_id,
            raw_material_id,
            price_per_unit,
        });
        id
    }

    pub async fn raw_material(&self, id: Uuid) -> Option<RawMaterial> {
        let state = self.state.lock().await;
        state.data.raw_materials.iter().find(|r| r.id == id).cloned()
    }

    pub async fn finished_good(&self, id: Uuid) -> Option<FinishedGood> {
        let state = self.state.lock().await;
        state.data.finished_goods.iter().find(|f| f.id == id).cloned()
    }

    pub async fn finished_good_count(&self) -> usize {
        self.state.lock().await.data.finished_goods.len()
    }

    pub async fn stock_ins(&self) -> Vec<StockIn> {
        self.state.lock().await.data.stock_ins.clone()
    }

    pub async fn stock_out_count(&self) -> usize {
        self.state.lock().await.data.stock_outs.len()
    }

    pub async fn production_run_count(&self) -> usize {
        self.state.lock().await.data.production_runs.len()
    }

    pub async fn production_materials(&self) -> Vec<ProductionMaterial> {
        self.state.lock().await.data.production_materials.clone()
    }

    pub async fn purchase_return_count(&self) -> usize {
        self.state.lock().await.data.purchase_returns.len()
    }

    pub async fn purchase_return_detail_count(&self) -> usize {
        self.state.lock().await.data.purchase_return_details.len()
    }

    /// Stock rows locked so far, oldest first
    pub async fn lock_log(&self) -> Vec<Uuid> {
        self.state.lock().await.lock_log.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Tx = MemoryLedgerTx;

    async fn begin(&self) -> AppResult<MemoryLedgerTx> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.data.clone();
        Ok(MemoryLedgerTx { guard, staged })
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn outlet_exists(&self, business_id: Uuid, outlet_id: Uuid) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.data.outlet_in_business(business_id, outlet_id))
    }

    async fn list_raw_materials(&self, outlet_id: Uuid) -> AppResult<Vec<RawMaterial>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .data
            .raw_materials
            .iter()
            .filter(|r| r.outlet_id == outlet_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_finished_goods(&self, outlet_id: Uuid) -> AppResult<Vec<FinishedGood>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .data
            .finished_goods
            .iter()
            .filter(|f| f.outlet_id == outlet_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_stock_outs(&self, outlet_id: Uuid) -> AppResult<Vec<StockOut>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .data
            .stock_outs
            .iter()
            .filter(|s| s.outlet_id == outlet_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    async fn production_run(
        &self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<ProductionRunDetail>> {
        let state = self.state.lock().await;
        let data = &state.data;
        let run = data
            .production_runs
            .iter()
            .find(|r| r.id == id && data.outlet_in_business(business_id, r.outlet_id))
            .cloned();

        Ok(run.map(|run| {
            let materials = data
                .production_materials
                .iter()
                .filter(|m| m.production_run_id == run.id)
                .cloned()
                .collect();
            ProductionRunDetail { run, materials }
        }))
    }

    async fn purchase_return(
        &self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<PurchaseReturnWithDetails>> {
        let state = self.state.lock().await;
        let data = &state.data;
        let header = data
            .purchase_returns
            .iter()
            .find(|r| r.id == id && data.outlet_in_business(business_id, r.outlet_id))
            .cloned();

        Ok(header.map(|header| {
            let details = data
                .purchase_return_details
                .iter()
                .filter(|d| d.purchase_return_id == header.id)
                .cloned()
                .collect();
            PurchaseReturnWithDetails { header, details }
        }))
    }
}

impl MemoryLedgerTx {
    fn hit(&mut self, step: Step) -> AppResult<()> {
        self.guard.faults.hit(step)
    }

    fn raw_material_mut(&mut self, id: Uuid) -> AppResult<&mut RawMaterial> {
        self.staged
            .raw_materials
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::DatabaseError(sqlx::Error::RowNotFound))
    }

    fn finished_good_mut(&mut self, id: Uuid) -> AppResult<&mut FinishedGood> {
        self.staged
            .finished_goods
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::DatabaseError(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn outlet_in_business(&mut self, business_id: Uuid, outlet_id: Uuid) -> AppResult<bool> {
        Ok(self.staged.outlet_in_business(business_id, outlet_id))
    }

    async fn lock_raw_material(
        &mut self,
        outlet_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<RawMaterial>> {
        self.guard.lock_log.push(id);
        Ok(self
            .staged
            .raw_materials
            .iter()
            .find(|r| r.id == id && r.outlet_id == outlet_id)
            .cloned())
    }

    async fn write_raw_material_levels(
        &mut self,
        id: Uuid,
        levels: &RawMaterialLevels,
    ) -> AppResult<()> {
        self.hit(Step::WriteRawMaterial)?;
        self.raw_material_mut(id)?.apply_levels(levels, Utc::now());
        Ok(())
    }

    async fn raw_material_candidates(
        &mut self,
        outlet_id: Uuid,
        plan: &[LookupKey],
    ) -> AppResult<Vec<RawMaterialCandidate>> {
        let joined: Vec<(Uuid, Uuid)> = plan
            .iter()
            .filter_map(|key| match key {
                LookupKey::InvoiceItem(item_id) => self
                    .staged
                    .invoice_items
                    .iter()
                    .find(|item| item.id == *item_id)
                    .and_then(|item| item.raw_material_id.map(|rm| (item.id, rm))),
                _ => None,
            })
            .collect();

        let candidates = self
            .staged
            .raw_materials
            .iter()
            .filter(|r| r.outlet_id == outlet_id)
            .map(|r| RawMaterialCandidate {
                id: r.id,
                name: r.name.clone(),
                sku: r.sku.clone(),
                via_invoice_item: joined
                    .iter()
                    .find(|(_, rm)| *rm == r.id)
                    .map(|(item_id, _)| *item_id),
            })
            .filter(|candidate| plan.iter().any(|key| key.matches(candidate)))
            .collect();

        Ok(candidates)
    }

    async fn lock_finished_good(
        &mut self,
        outlet_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<FinishedGood>> {
        self.guard.lock_log.push(id);
        Ok(self
            .staged
            .finished_goods
            .iter()
            .find(|f| f.id == id && f.outlet_id == outlet_id)
            .cloned())
    }

    async fn write_finished_good_levels(
        &mut self,
        id: Uuid,
        levels: &FinishedGoodLevels,
    ) -> AppResult<()> {
        self.hit(Step::WriteFinishedGood)?;
        self.finished_good_mut(id)?.apply_levels(levels, Utc::now());
        Ok(())
    }

    async fn insert_finished_good(&mut self, input: NewFinishedGood) -> AppResult<FinishedGood> {
        self.hit(Step::InsertFinishedGood)?;
        let now = Utc::now();
        let row = FinishedGood {
            id: Uuid::new_v4(),
            outlet_id: input.outlet_id,
            sku: input.sku,
            name: input.name,
            unit: input.unit,
            initial_stock: input.levels.initial_stock,
            remaining_stock: input.levels.remaining_stock,
            price_per_unit: input.price_per_unit,
            created_at: now,
            updated_at: now,
        };
        self.staged.finished_goods.push(row.clone());
        Ok(row)
    }

    async fn invoice_item_context(
        &mut self,
        business_id: Uuid,
        invoice_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Option<InvoiceItemContext>> {
        let Some(item) = self
            .staged
            .invoice_items
            .iter()
            .find(|item| item.id == item_id && item.invoice_id == invoice_id)
        else {
            return Ok(None);
        };
        let Some(outlet_id) = self.staged.invoice_outlet(invoice_id) else {
            return Ok(None);
        };
        if !self.staged.outlet_in_business(business_id, outlet_id) {
            return Ok(None);
        }

        Ok(Some(InvoiceItemContext {
            id: item.id,
            purchase_invoice_id: item.invoice_id,
            outlet_id,
            price_per_unit: item.price_per_unit,
        }))
    }

    async fn insert_stock_in(&mut self, input: NewStockIn) -> AppResult<StockIn> {
        self.hit(Step::InsertStockIn)?;
        let row = StockIn {
            id: Uuid::new_v4(),
            purchase_invoice_item_id: input.purchase_invoice_item_id,
            quantity_in: input.quantity_in,
            total_value: input.total_value,
            received_date: input.received_date,
            proof_images: input.proof_images,
            created_by: Some(input.created_by),
            created_at: Utc::now(),
        };
        self.staged.stock_ins.push(row.clone());
        Ok(row)
    }

    async fn lock_stock_in(&mut self, business_id: Uuid, id: Uuid) -> AppResult<Option<StockIn>> {
        let data = &self.staged;
        let visible = |row: &StockIn| {
            data.invoice_items
                .iter()
                .find(|item| item.id == row.purchase_invoice_item_id)
                .and_then(|item| data.invoice_outlet(item.invoice_id))
                .is_some_and(|outlet_id| data.outlet_in_business(business_id, outlet_id))
        };

        Ok(data
            .stock_ins
            .iter()
            .find(|row| row.id == id && visible(row))
            .cloned())
    }

    async fn delete_stock_in(&mut self, id: Uuid) -> AppResult<()> {
        self.hit(Step::DeleteStockIn)?;
        self.staged.stock_ins.retain(|row| row.id != id);
        Ok(())
    }

    async fn insert_stock_out(&mut self, input: NewStockOut) -> AppResult<StockOut> {
        self.hit(Step::InsertStockOut)?;
        let row = StockOut {
            id: Uuid::new_v4(),
            outlet_id: input.outlet_id,
            finished_good_id: input.finished_good_id,
            quantity_out: input.quantity_out,
            stock_out_number: input.stock_out_number,
            transaction_date: input.transaction_date,
            proof_images: input.proof_images,
            notes: input.notes,
            created_by: Some(input.created_by),
            created_at: Utc::now(),
        };
        self.staged.stock_outs.push(row.clone());
        Ok(row)
    }

    async fn lock_stock_out(&mut self, business_id: Uuid, id: Uuid) -> AppResult<Option<StockOut>> {
        let data = &self.staged;
        Ok(data
            .stock_outs
            .iter()
            .find(|row| row.id == id && data.outlet_in_business(business_id, row.outlet_id))
            .cloned())
    }

    async fn delete_stock_out(&mut self, id: Uuid) -> AppResult<()> {
        self.hit(Step::DeleteStockOut)?;
        self.staged.stock_outs.retain(|row| row.id != id);
        Ok(())
    }

    async fn insert_production_run(&mut self, input: NewProductionRun) -> AppResult<ProductionRun> {
        self.hit(Step::InsertProductionRun)?;
        let row = ProductionRun {
            id: Uuid::new_v4(),
            outlet_id: input.outlet_id,
            finished_good_id: input.finished_good_id,
            quantity_produced: input.quantity_produced,
            production_type: input.production_type.as_str().to_string(),
            total_cost: input.total_cost,
            created_by: Some(input.created_by),
            created_at: Utc::now(),
        };
        self.staged.production_runs.push(row.clone());
        Ok(row)
    }

    async fn insert_production_material(
        &mut self,
        input: NewProductionMaterial,
    ) -> AppResult<ProductionMaterial> {
        self.hit(Step::InsertProductionMaterial)?;
        let row = ProductionMaterial {
            id: Uuid::new_v4(),
            production_run_id: input.production_run_id,
            raw_material_id: input.raw_material_id,
            quantity_used: input.quantity_used,
            price_per_unit: input.price_per_unit,
            created_at: Utc::now(),
        };
        self.staged.production_materials.push(row.clone());
        Ok(row)
    }

    async fn purchase_invoice_in_outlet(
        &mut self,
        outlet_id: Uuid,
        invoice_id: Uuid,
    ) -> AppResult<bool> {
        Ok(self.staged.invoice_outlet(invoice_id) == Some(outlet_id))
    }

    async fn insert_purchase_return(
        &mut self,
        input: NewPurchaseReturn,
    ) -> AppResult<PurchaseReturn> {
        self.hit(Step::InsertPurchaseReturn)?;
        let row = PurchaseReturn {
            id: Uuid::new_v4(),
            outlet_id: input.outlet_id,
            purchase_invoice_id: input.purchase_invoice_id,
            return_number: input.return_number,
            return_date: input.return_date,
            reason: input.reason,
            total_value: Decimal::ZERO,
            created_by: Some(input.created_by),
            created_at: Utc::now(),
        };
        self.staged.purchase_returns.push(row.clone());
        Ok(row)
    }

    async fn insert_purchase_return_detail(
        &mut self,
        input: NewPurchaseReturnDetail,
    ) -> AppResult<PurchaseReturnDetail> {
        self.hit(Step::InsertPurchaseReturnDetail)?;
        let row = PurchaseReturnDetail {
            id: Uuid::new_v4(),
            purchase_return_id: input.purchase_return_id,
            raw_material_id: input.raw_material_id,
            quantity_returned: input.quantity_returned,
            unit_price_return: input.unit_price_return,
            total_value_return: input.total_value_return,
            created_at: Utc::now(),
        };
        self.staged.purchase_return_details.push(row.clone());
        Ok(row)
    }

    async fn set_purchase_return_total(&mut self, id: Uuid, total_value: Decimal) -> AppResult<()> {
        self.hit(Step::SetPurchaseReturnTotal)?;
        let header = self
            .staged
            .purchase_returns
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::DatabaseError(sqlx::Error::RowNotFound))?;
        header.total_value = total_value;
        Ok(())
    }

    async fn lock_purchase_return(
        &mut self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<PurchaseReturn>> {
        let data = &self.staged;
        Ok(data
            .purchase_returns
            .iter()
            .find(|r| r.id == id && data.outlet_in_business(business_id, r.outlet_id))
            .cloned())
    }

    async fn purchase_return_details(&mut self, id: Uuid) -> AppResult<Vec<PurchaseReturnDetail>> {
        Ok(self
            .staged
            .purchase_return_details
            .iter()
            .filter(|d| d.purchase_return_id == id)
            .cloned()
            .collect())
    }

    async fn delete_purchase_return(&mut self, id: Uuid) -> AppResult<()> {
        self.hit(Step::DeletePurchaseReturn)?;
        self.staged
            .purchase_return_details
            .retain(|d| d.purchase_return_id != id);
        self.staged.purchase_returns.retain(|r| r.id != id);
        Ok(())
    }

    async fn commit(mut self) -> AppResult<()> {
        self.hit(Step::Commit)?;
        self.guard.data = self.staged;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        Ok(())
    }
}
