//! Production tests
//!
//! Tests for production runs including:
//! - Costing and unit price of the output
//! - Silent clamp of consumed raw materials
//! - New vs existed finished goods
//! - Rollback of the whole run on failure
//! - Range errors from costing arithmetic
//! - Row locks taken in id order

mod common;

use common::{dec, levels, Fixture};
use proptest::prelude::*;
use shared::{
    CreateProductionInput, ExistedProductionInput, NewProductionInput, ProductionMaterialLine,
};
use stock_ledger_backend::error::AppError;
use stock_ledger_backend::services::ProductionService;
use stock_ledger_backend::store::Step;
use uuid::Uuid;

fn material(raw_material_id: Uuid, quantity: &str, price: &str) -> ProductionMaterialLine {
    ProductionMaterialLine {
        raw_material_id,
        quantity_used: dec(quantity),
        price_per_unit: dec(price),
    }
}

fn new_run(outlet_id: Uuid, amount: &str, products: Vec<ProductionMaterialLine>) -> CreateProductionInput {
    CreateProductionInput::New(NewProductionInput {
        outlet_id,
        finished_name: "Bread".to_string(),
        finished_sku: Some("BR-01".to_string()),
        finished_unit: "pcs".to_string(),
        finished_amount: dec(amount),
        products,
    })
}

fn existed_run(
    outlet_id: Uuid,
    finished_good_id: Uuid,
    amount: &str,
    products: Vec<ProductionMaterialLine>,
) -> CreateProductionInput {
    CreateProductionInput::Existed(ExistedProductionInput {
        outlet_id,
        finished_good_id,
        finished_amount: dec(amount),
        products,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// [{2, 1000}, {3, 500}] for 10 units → cost 3500, price 350.00
    #[tokio::test]
    async fn test_new_run_costing() {
        let fx = Fixture::new().await;
        let flour = fx.raw_material("Flour", levels("0", None, "20"), "1000").await;
        let sugar = fx.raw_material("Sugar", levels("0", None, "20"), "500").await;

        let receipt = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                new_run(
                    fx.outlet_id,
                    "10",
                    vec![material(flour, "2", "1000"), material(sugar, "3", "500")],
                ),
            )
            .await
            .unwrap();

        assert_eq!(receipt.total_cost, dec("3500"));
        assert_eq!(receipt.price_per_unit, dec("350.00"));

        let good = fx.store.finished_good(receipt.finished_good_id).await.unwrap();
        assert_eq!(good.remaining_stock, dec("10"));
        assert_eq!(good.initial_stock, dec("10"));
        assert_eq!(good.price_per_unit, dec("350.00"));
        assert_eq!(good.name, "Bread");

        let row = fx.store.raw_material(flour).await.unwrap();
        assert_eq!(row.opening_stock, dec("20"));
        assert_eq!(row.remaining_stock, dec("18"));
        assert_eq!(row.stock_in_production, dec("2"));
        assert_eq!(fx.remaining_raw(sugar).await, dec("17"));
    }

    /// Remaining 3, used 10 → remaining 0, the material row still records 10
    #[tokio::test]
    async fn test_consumption_clamps_at_zero() {
        let fx = Fixture::new().await;
        let cocoa = fx.raw_material("Cocoa", levels("0", None, "3"), "1").await;

        ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                new_run(fx.outlet_id, "1", vec![material(cocoa, "10", "1")]),
            )
            .await
            .unwrap();

        let row = fx.store.raw_material(cocoa).await.unwrap();
        assert_eq!(row.remaining_stock, dec("0"));
        assert_eq!(row.opening_stock, dec("3"));
        assert_eq!(row.stock_in_production, dec("10"));

        let materials = fx.store.production_materials().await;
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].quantity_used, dec("10"));
    }

    #[tokio::test]
    async fn test_zero_amount_has_zero_unit_price() {
        let fx = Fixture::new().await;
        let cocoa = fx.raw_material("Cocoa", levels("0", None, "3"), "4").await;

        let receipt = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                new_run(fx.outlet_id, "0", vec![material(cocoa, "1", "4")]),
            )
            .await
            .unwrap();

        assert_eq!(receipt.total_cost, dec("4"));
        assert_eq!(receipt.price_per_unit, dec("0"));
    }

    /// Existing output only moves remaining_stock
    #[tokio::test]
    async fn test_existed_run_increments_finished_good() {
        let fx = Fixture::new().await;
        let cake = fx.finished_good("Cake", "5").await;
        let flour = fx.raw_material("Flour", levels("0", None, "8"), "2").await;

        let receipt = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                existed_run(fx.outlet_id, cake, "4", vec![material(flour, "2", "2")]),
            )
            .await
            .unwrap();

        assert_eq!(receipt.finished_good_id, cake);
        let good = fx.store.finished_good(cake).await.unwrap();
        assert_eq!(good.remaining_stock, dec("9"));
        assert_eq!(good.initial_stock, dec("5"));
        assert_eq!(fx.store.finished_good_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_material_rolls_back_new_finished_good() {
        let fx = Fixture::new().await;
        let flour = fx.raw_material("Flour", levels("0", None, "20"), "1").await;
        let sugar = fx.raw_material("Sugar", levels("0", None, "20"), "1").await;

        fx.store.fail_on(Step::WriteRawMaterial, 2).await;

        let result = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                new_run(
                    fx.outlet_id,
                    "10",
                    vec![material(flour, "2", "1"), material(sugar, "3", "1")],
                ),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(fx.store.finished_good_count().await, 0);
        assert_eq!(fx.store.production_run_count().await, 0);
        assert!(fx.store.production_materials().await.is_empty());
        assert_eq!(fx.remaining_raw(flour).await, dec("20"));
        assert_eq!(fx.remaining_raw(sugar).await, dec("20"));
    }

    #[tokio::test]
    async fn test_failed_run_rolls_back_existed_increment() {
        let fx = Fixture::new().await;
        let cake = fx.finished_good("Cake", "5").await;
        let flour = fx.raw_material("Flour", levels("0", None, "8"), "2").await;

        fx.store.fail_on(Step::InsertProductionMaterial, 1).await;

        let result = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                existed_run(fx.outlet_id, cake, "4", vec![material(flour, "2", "2")]),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(fx.remaining_finished(cake).await, dec("5"));
        assert_eq!(fx.remaining_raw(flour).await, dec("8"));
    }

    #[tokio::test]
    async fn test_raw_material_of_other_outlet_is_rejected() {
        let fx = Fixture::new().await;
        let other_outlet = fx.store.add_outlet(fx.business_id).await;
        let foreign = fx
            .store
            .add_raw_material(other_outlet, "Flour", None, levels("0", None, "9"), dec("1"))
            .await;

        let err = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                new_run(fx.outlet_id, "1", vec![material(foreign, "1", "1")]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(fx.remaining_raw(foreign).await, dec("9"));
        assert_eq!(fx.store.finished_good_count().await, 0);
    }

    #[tokio::test]
    async fn test_outlet_of_other_business_is_rejected() {
        let fx = Fixture::new().await;
        let flour = fx.raw_material("Flour", levels("0", None, "9"), "1").await;

        let err = ProductionService::new(fx.store.clone())
            .produce(
                Uuid::new_v4(),
                fx.user_id,
                new_run(fx.outlet_id, "1", vec![material(flour, "1", "1")]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_finished_good_is_rejected() {
        let fx = Fixture::new().await;
        let flour = fx.raw_material("Flour", levels("0", None, "9"), "1").await;

        let err = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                existed_run(fx.outlet_id, Uuid::new_v4(), "1", vec![material(flour, "1", "1")]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(fx.remaining_raw(flour).await, dec("9"));
    }

    #[tokio::test]
    async fn test_empty_products_fail_validation() {
        let fx = Fixture::new().await;

        let err = ProductionService::new(fx.store.clone())
            .produce(fx.business_id, fx.user_id, new_run(fx.outlet_id, "1", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "products"));
    }

    #[tokio::test]
    async fn test_produced_amount_beyond_four_places_is_rejected() {
        let fx = Fixture::new().await;
        let flour = fx.raw_material("Flour", levels("0", None, "9"), "1").await;

        let err = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                new_run(fx.outlet_id, "0.0000000001", vec![material(flour, "1", "1")]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "finished_amount"));
        assert_eq!(fx.store.finished_good_count().await, 0);
    }

    /// A total within range spread over 0.0001 units overflows the unit price
    #[tokio::test]
    async fn test_unit_cost_overflow_is_validation_error() {
        let fx = Fixture::new().await;
        let flour = fx.raw_material("Flour", levels("0", None, "9"), "1").await;

        let err = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                new_run(fx.outlet_id, "0.0001", vec![material(flour, "99999999", "99999999")]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(fx.store.finished_good_count().await, 0);
        assert_eq!(fx.store.production_run_count().await, 0);
        assert_eq!(fx.remaining_raw(flour).await, dec("9"));
    }

    #[tokio::test]
    async fn test_cost_overflow_is_validation_error() {
        let fx = Fixture::new().await;
        let cake = fx.finished_good("Cake", "5").await;
        let flour = fx.raw_material("Flour", levels("0", None, "9"), "1").await;

        let err = ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                existed_run(
                    fx.outlet_id,
                    cake,
                    "1",
                    vec![material(flour, "99999999999999", "9999999999999999.99")],
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(fx.remaining_finished(cake).await, dec("5"));
        assert_eq!(fx.remaining_raw(flour).await, dec("9"));
    }

    /// The output row is locked first, then materials in ascending id order
    #[tokio::test]
    async fn test_raw_materials_lock_in_id_order() {
        let fx = Fixture::new().await;
        let cake = fx.finished_good("Cake", "5").await;
        let flour = fx.raw_material("Flour", levels("0", None, "9"), "1").await;
        let sugar = fx.raw_material("Sugar", levels("0", None, "9"), "1").await;
        let (low, high) = if flour < sugar { (flour, sugar) } else { (sugar, flour) };

        ProductionService::new(fx.store.clone())
            .produce(
                fx.business_id,
                fx.user_id,
                existed_run(
                    fx.outlet_id,
                    cake,
                    "2",
                    vec![material(high, "1", "1"), material(low, "2", "1"), material(high, "3", "1")],
                ),
            )
            .await
            .unwrap();

        assert_eq!(fx.store.lock_log().await, vec![cake, low, high]);
        assert_eq!(fx.remaining_raw(high).await, dec("5"));
        assert_eq!(fx.remaining_raw(low).await, dec("7"));
        assert_eq!(fx.store.production_materials().await.len(), 3);
    }

    #[tokio::test]
    async fn test_get_run_includes_materials() {
        let fx = Fixture::new().await;
        let flour = fx.raw_material("Flour", levels("0", None, "9"), "1").await;
        let service = ProductionService::new(fx.store.clone());

        let receipt = service
            .produce(
                fx.business_id,
                fx.user_id,
                new_run(fx.outlet_id, "3", vec![material(flour, "2", "1.5")]),
            )
            .await
            .unwrap();

        let detail = service
            .get_run(fx.business_id, receipt.production_run_id)
            .await
            .unwrap();
        assert_eq!(detail.run.production_type, "new");
        assert_eq!(detail.run.quantity_produced, dec("3"));
        assert_eq!(detail.run.total_cost, dec("3"));
        assert_eq!(detail.materials.len(), 1);
        assert_eq!(detail.materials[0].price_per_unit, dec("1.5"));

        let hidden = service
            .get_run(Uuid::new_v4(), receipt.production_run_id)
            .await
            .unwrap_err();
        assert!(matches!(hidden, AppError::NotFound(_)));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;
    use rust_decimal::Decimal;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Consumption never drives a raw material negative and always records
        /// the full quantity used
        #[test]
        fn prop_consumption_never_negative(
            remaining in 0i64..500,
            used in 1i64..1_000,
        ) {
            tokio_test::block_on(async {
                let fx = Fixture::new().await;
                let start = Decimal::from(remaining);
                let id = fx
                    .store
                    .add_raw_material(
                        fx.outlet_id,
                        "Flour",
                        None,
                        shared::RawMaterialLevels {
                            remaining_stock: start,
                            ..Default::default()
                        },
                        Decimal::ONE,
                    )
                    .await;

                let mut line = material(id, "1", "1");
                line.quantity_used = Decimal::from(used);

                ProductionService::new(fx.store.clone())
                    .produce(fx.business_id, fx.user_id, new_run(fx.outlet_id, "1", vec![line]))
                    .await
                    .unwrap();

                let row = fx.store.raw_material(id).await.unwrap();
                assert_eq!(row.remaining_stock, (start - Decimal::from(used)).max(Decimal::ZERO));
                assert_eq!(row.stock_in_production, Decimal::from(used));
                assert_eq!(row.opening_stock, start);
            });
        }
    }
}
