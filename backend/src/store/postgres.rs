//! PostgreSQL implementation of the ledger store

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{FinishedGoodLevels, LookupKey, RawMaterialCandidate, RawMaterialLevels};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{LedgerStore, LedgerTx};
use crate::error::AppResult;
use crate::models::{
    FinishedGood, InvoiceItemContext, NewFinishedGood, NewProductionMaterial, NewProductionRun,
    NewPurchaseReturn, NewPurchaseReturnDetail, NewStockIn, NewStockOut, ProductionMaterial,
    ProductionRun, ProductionRunDetail, PurchaseReturn, PurchaseReturnDetail,
    PurchaseReturnWithDetails, RawMaterial, StockIn, StockOut,
};

const RAW_MATERIAL_COLUMNS: &str = "rm.id, rm.outlet_id, rm.sku, rm.name, rm.unit, \
    rm.opening_stock, rm.stock_in, rm.stock_in_production, rm.remaining_stock, \
    rm.price_per_unit, rm.created_at, rm.updated_at";

const FINISHED_GOOD_COLUMNS: &str = "fg.id, fg.outlet_id, fg.sku, fg.name, fg.unit, \
    fg.initial_stock, fg.remaining_stock, fg.price_per_unit, fg.created_at, fg.updated_at";

const STOCK_OUT_COLUMNS: &str = "so.id, so.outlet_id, so.finished_good_id, so.quantity_out, \
    so.stock_out_number, so.transaction_date, so.proof_images, so.notes, so.created_by, \
    so.created_at";

const PURCHASE_RETURN_COLUMNS: &str = "pr.id, pr.outlet_id, pr.purchase_invoice_id, \
    pr.return_number, pr.return_date, pr.reason, pr.total_value, pr.created_by, pr.created_at";

/// Pooled PostgreSQL store
#[derive(Clone)]
pub struct PgLedgerStore {
    db: PgPool,
}

impl PgLedgerStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// A PostgreSQL transaction
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    name: String,
    sku: Option<String>,
    via_invoice_item: Option<Uuid>,
}

impl From<CandidateRow> for RawMaterialCandidate {
    fn from(row: CandidateRow) -> Self {
        RawMaterialCandidate {
            id: row.id,
            name: row.name,
            sku: row.sku,
            via_invoice_item: row.via_invoice_item,
        }
    }
}

/// Lookup keys split into bindable arrays
#[derive(Default)]
struct PlanParams {
    ids: Vec<Uuid>,
    names: Vec<String>,
    skus: Vec<String>,
    invoice_item: Option<Uuid>,
}

impl PlanParams {
    fn from_plan(plan: &[LookupKey]) -> Self {
        let mut params = PlanParams::default();
        for key in plan {
            match key {
                LookupKey::Id(id) => params.ids.push(*id),
                LookupKey::Name(name) => params.names.push(name.trim().to_lowercase()),
                LookupKey::Sku(sku) => params.skus.push(sku.clone()),
                LookupKey::InvoiceItem(item_id) => params.invoice_item = Some(*item_id),
            }
        }
        params
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> AppResult<PgLedgerTx> {
        let tx = self.db.begin().await?;
        Ok(PgLedgerTx { tx })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn outlet_exists(&self, business_id: Uuid, outlet_id: Uuid) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM outlets WHERE id = $1 AND business_id = $2)",
        )
        .bind(outlet_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn list_raw_materials(&self, outlet_id: Uuid) -> AppResult<Vec<RawMaterial>> {
        let rows = sqlx::query_as::<_, RawMaterial>(&format!(
            "SELECT {} FROM raw_materials rm WHERE rm.outlet_id = $1 ORDER BY rm.name",
            RAW_MATERIAL_COLUMNS
        ))
        .bind(outlet_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn list_finished_goods(&self, outlet_id: Uuid) -> AppResult<Vec<FinishedGood>> {
        let rows = sqlx::query_as::<_, FinishedGood>(&format!(
            "SELECT {} FROM finished_goods fg WHERE fg.outlet_id = $1 ORDER BY fg.name",
            FINISHED_GOOD_COLUMNS
        ))
        .bind(outlet_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn list_stock_outs(&self, outlet_id: Uuid) -> AppResult<Vec<StockOut>> {
        let rows = sqlx::query_as::<_, StockOut>(&format!(
            "SELECT {} FROM stock_outs so WHERE so.outlet_id = $1 \
             ORDER BY so.transaction_date DESC, so.created_at DESC",
            STOCK_OUT_COLUMNS
        ))
        .bind(outlet_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn production_run(
        &self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<ProductionRunDetail>> {
        let run = sqlx::query_as::<_, ProductionRun>(
            r#"
            SELECT r.id, r.outlet_id, r.finished_good_id, r.quantity_produced, r.production_type,
                   r.total_cost, r.created_by, r.created_at
            FROM production_runs r
            JOIN outlets o ON o.id = r.outlet_id
            WHERE r.id = $1 AND o.business_id = $2
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(run) = run else {
            return Ok(None);
        };

        let materials = sqlx::query_as::<_, ProductionMaterial>(
            r#"
            SELECT id, production_run_id, raw_material_id, quantity_used, price_per_unit, created_at
            FROM production_materials
            WHERE production_run_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(run.id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(ProductionRunDetail { run, materials }))
    }

    async fn purchase_return(
        &self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<PurchaseReturnWithDetails>> {
        let header = sqlx::query_as::<_, PurchaseReturn>(&format!(
            "SELECT {} FROM purchase_returns pr \
             JOIN outlets o ON o.id = pr.outlet_id \
             WHERE pr.id = $1 AND o.business_id = $2",
            PURCHASE_RETURN_COLUMNS
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let details = sqlx::query_as::<_, PurchaseReturnDetail>(
            r#"
            SELECT id, purchase_return_id, raw_material_id, quantity_returned,
                   unit_price_return, total_value_return, created_at
            FROM purchase_return_details
            WHERE purchase_return_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(header.id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(PurchaseReturnWithDetails { header, details }))
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn outlet_in_business(&mut self, business_id: Uuid, outlet_id: Uuid) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM outlets WHERE id = $1 AND business_id = $2)",
        )
        .bind(outlet_id)
        .bind(business_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn lock_raw_material(
        &mut self,
        outlet_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<RawMaterial>> {
        let row = sqlx::query_as::<_, RawMaterial>(&format!(
            "SELECT {} FROM raw_materials rm WHERE rm.id = $1 AND rm.outlet_id = $2 FOR UPDATE",
            RAW_MATERIAL_COLUMNS
        ))
        .bind(id)
        .bind(outlet_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn write_raw_material_levels(
        &mut self,
        id: Uuid,
        levels: &RawMaterialLevels,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE raw_materials
            SET opening_stock = $2, stock_in = $3, stock_in_production = $4,
                remaining_stock = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(levels.opening_stock)
        .bind(levels.stock_in)
        .bind(levels.stock_in_production)
        .bind(levels.remaining_stock)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn raw_material_candidates(
        &mut self,
        outlet_id: Uuid,
        plan: &[LookupKey],
    ) -> AppResult<Vec<RawMaterialCandidate>> {
        let params = PlanParams::from_plan(plan);

        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            WITH joined AS (
                SELECT pii.id AS item_id, pod.raw_material_id
                FROM purchase_invoice_items pii
                JOIN purchase_order_details pod ON pod.id = pii.purchase_order_detail_id
                WHERE pii.id = $5
            )
            SELECT rm.id, rm.name, rm.sku,
                   (SELECT j.item_id FROM joined j WHERE j.raw_material_id = rm.id) AS via_invoice_item
            FROM raw_materials rm
            WHERE rm.outlet_id = $1
              AND (rm.id = ANY($2)
                   OR LOWER(TRIM(rm.name)) = ANY($3)
                   OR rm.sku = ANY($4)
                   OR rm.id IN (SELECT raw_material_id FROM joined))
            ORDER BY rm.created_at, rm.id
            "#,
        )
        .bind(outlet_id)
        .bind(&params.ids)
        .bind(&params.names)
        .bind(&params.skus)
        .bind(params.invoice_item)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(RawMaterialCandidate::from).collect())
    }

    async fn lock_finished_good(
        &mut self,
        outlet_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<FinishedGood>> {
        let row = sqlx::query_as::<_, FinishedGood>(&format!(
            "SELECT {} FROM finished_goods fg WHERE fg.id = $1 AND fg.outlet_id = $2 FOR UPDATE",
            FINISHED_GOOD_COLUMNS
        ))
        .bind(id)
        .bind(outlet_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn write_finished_good_levels(
        &mut self,
        id: Uuid,
        levels: &FinishedGoodLevels,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE finished_goods
            SET initial_stock = $2, remaining_stock = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(levels.initial_stock)
        .bind(levels.remaining_stock)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_finished_good(&mut self, input: NewFinishedGood) -> AppResult<FinishedGood> {
        let row = sqlx::query_as::<_, FinishedGood>(
            r#"
            INSERT INTO finished_goods (
                outlet_id, sku, name, unit, initial_stock, remaining_stock, price_per_unit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, outlet_id, sku, name, unit, initial_stock, remaining_stock,
                      price_per_unit, created_at, updated_at
            "#,
        )
        .bind(input.outlet_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.unit)
        .bind(input.levels.initial_stock)
        .bind(input.levels.remaining_stock)
        .bind(input.price_per_unit)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn invoice_item_context(
        &mut self,
        business_id: Uuid,
        invoice_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Option<InvoiceItemContext>> {
        let row = sqlx::query_as::<_, InvoiceItemContext>(
            r#"
            SELECT pii.id, pii.purchase_invoice_id, pi.outlet_id, pii.price_per_unit
            FROM purchase_invoice_items pii
            JOIN purchase_invoices pi ON pi.id = pii.purchase_invoice_id
            JOIN outlets o ON o.id = pi.outlet_id
            WHERE pii.id = $1 AND pii.purchase_invoice_id = $2 AND o.business_id = $3
            "#,
        )
        .bind(item_id)
        .bind(invoice_id)
        .bind(business_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_stock_in(&mut self, input: NewStockIn) -> AppResult<StockIn> {
        let row = sqlx::query_as::<_, StockIn>(
            r#"
            INSERT INTO stock_ins (
                purchase_invoice_item_id, quantity_in, total_value, received_date,
                proof_images, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, purchase_invoice_item_id, quantity_in, total_value, received_date,
                      proof_images, created_by, created_at
            "#,
        )
        .bind(input.purchase_invoice_item_id)
        .bind(input.quantity_in)
        .bind(input.total_value)
        .bind(input.received_date)
        .bind(&input.proof_images)
        .bind(input.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn lock_stock_in(&mut self, business_id: Uuid, id: Uuid) -> AppResult<Option<StockIn>> {
        let row = sqlx::query_as::<_, StockIn>(
            r#"
            SELECT si.id, si.purchase_invoice_item_id, si.quantity_in, si.total_value,
                   si.received_date, si.proof_images, si.created_by, si.created_at
            FROM stock_ins si
            JOIN purchase_invoice_items pii ON pii.id = si.purchase_invoice_item_id
            JOIN purchase_invoices pi ON pi.id = pii.purchase_invoice_id
            JOIN outlets o ON o.id = pi.outlet_id
            WHERE si.id = $1 AND o.business_id = $2
            FOR UPDATE OF si
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn delete_stock_in(&mut self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM stock_ins WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_stock_out(&mut self, input: NewStockOut) -> AppResult<StockOut> {
        let row = sqlx::query_as::<_, StockOut>(
            r#"
            INSERT INTO stock_outs (
                outlet_id, finished_good_id, quantity_out, stock_out_number, transaction_date,
                proof_images, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, outlet_id, finished_good_id, quantity_out, stock_out_number,
                      transaction_date, proof_images, notes, created_by, created_at
            "#,
        )
        .bind(input.outlet_id)
        .bind(input.finished_good_id)
        .bind(input.quantity_out)
        .bind(&input.stock_out_number)
        .bind(input.transaction_date)
        .bind(&input.proof_images)
        .bind(&input.notes)
        .bind(input.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn lock_stock_out(&mut self, business_id: Uuid, id: Uuid) -> AppResult<Option<StockOut>> {
        let row = sqlx::query_as::<_, StockOut>(&format!(
            "SELECT {} FROM stock_outs so \
             JOIN outlets o ON o.id = so.outlet_id \
             WHERE so.id = $1 AND o.business_id = $2 \
             FOR UPDATE OF so",
            STOCK_OUT_COLUMNS
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn delete_stock_out(&mut self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM stock_outs WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_production_run(&mut self, input: NewProductionRun) -> AppResult<ProductionRun> {
        let row = sqlx::query_as::<_, ProductionRun>(
            r#"
            INSERT INTO production_runs (
                outlet_id, finished_good_id, quantity_produced, production_type, total_cost,
                created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, outlet_id, finished_good_id, quantity_produced, production_type,
                      total_cost, created_by, created_at
            "#,
        )
        .bind(input.outlet_id)
        .bind(input.finished_good_id)
        .bind(input.quantity_produced)
        .bind(input.production_type.as_str())
        .bind(input.total_cost)
        .bind(input.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_production_material(
        &mut self,
        input: NewProductionMaterial,
    ) -> AppResult<ProductionMaterial> {
        let row = sqlx::query_as::<_, ProductionMaterial>(
            r#"
            INSERT INTO production_materials (
                production_run_id, raw_material_id, quantity_used, price_per_unit
            )
            VALUES ($1, $2, $3, $4)
            RETURNING id, production_run_id, raw_material_id, quantity_used, price_per_unit,
                      created_at
            "#,
        )
        .bind(input.production_run_id)
        .bind(input.raw_material_id)
        .bind(input.quantity_used)
        .bind(input.price_per_unit)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn purchase_invoice_in_outlet(
        &mut self,
        outlet_id: Uuid,
        invoice_id: Uuid,
    ) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_invoices WHERE id = $1 AND outlet_id = $2)",
        )
        .bind(invoice_id)
        .bind(outlet_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn insert_purchase_return(
        &mut self,
        input: NewPurchaseReturn,
    ) -> AppResult<PurchaseReturn> {
        let row = sqlx::query_as::<_, PurchaseReturn>(
            r#"
            INSERT INTO purchase_returns (
                outlet_id, purchase_invoice_id, return_number, return_date, reason, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, outlet_id, purchase_invoice_id, return_number, return_date, reason,
                      total_value, created_by, created_at
            "#,
        )
        .bind(input.outlet_id)
        .bind(input.purchase_invoice_id)
        .bind(&input.return_number)
        .bind(input.return_date)
        .bind(&input.reason)
        .bind(input.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_purchase_return_detail(
        &mut self,
        input: NewPurchaseReturnDetail,
    ) -> AppResult<PurchaseReturnDetail> {
        let row = sqlx::query_as::<_, PurchaseReturnDetail>(
            r#"
            INSERT INTO purchase_return_details (
                purchase_return_id, raw_material_id, quantity_returned, unit_price_return,
                total_value_return
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, purchase_return_id, raw_material_id, quantity_returned,
                      unit_price_return, total_value_return, created_at
            "#,
        )
        .bind(input.purchase_return_id)
        .bind(input.raw_material_id)
        .bind(input.quantity_returned)
        .bind(input.unit_price_return)
        .bind(input.total_value_return)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn set_purchase_return_total(&mut self, id: Uuid, total_value: Decimal) -> AppResult<()> {
        sqlx::query("UPDATE purchase_returns SET total_value = $2 WHERE id = $1")
            .bind(id)
            .bind(total_value)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn lock_purchase_return(
        &mut self,
        business_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<PurchaseReturn>> {
        let row = sqlx::query_as::<_, PurchaseReturn>(&format!(
            "SELECT {} FROM purchase_returns pr \
             JOIN outlets o ON o.id = pr.outlet_id \
             WHERE pr.id = $1 AND o.business_id = $2 \
             FOR UPDATE OF pr",
            PURCHASE_RETURN_COLUMNS
        ))
        .bind(id)
        .bind(business_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn purchase_return_details(&mut self, id: Uuid) -> AppResult<Vec<PurchaseReturnDetail>> {
        let rows = sqlx::query_as::<_, PurchaseReturnDetail>(
            r#"
            SELECT id, purchase_return_id, raw_material_id, quantity_returned,
                   unit_price_return, total_value_return, created_at
            FROM purchase_return_details
            WHERE purchase_return_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn delete_purchase_return(&mut self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM purchase_return_details WHERE purchase_return_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        sqlx::query("DELETE FROM purchase_returns WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
