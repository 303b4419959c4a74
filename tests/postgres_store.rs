// Testes contra um Postgres real. Rodam só com DATABASE_URL apontando para um banco
// descartável: `cargo test --test postgres_store -- --ignored`.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use salad_shop_inventory::{
    common::AppError,
    db::{InventoryRepository, InventoryStore},
    models::inventory::{MovementType, Unit},
    services::{InventoryService, MovementLedger},
};
use sqlx::postgres::PgPoolOptions;

async fn connect() -> Option<(InventoryService, MovementLedger)> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty())?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("failed to connect to DATABASE_URL");
    sqlx::migrate!().run(&pool).await.expect("failed to run migrations");

    let store: Arc<dyn InventoryStore> = Arc::new(InventoryRepository::new(pool));
    Some((
        InventoryService::new(Arc::clone(&store), false, 20),
        MovementLedger::new(store, false, 3),
    ))
}

// O banco sobrevive entre execuções: cada teste usa SKUs novos.
fn unique_sku(prefix: &str) -> String {
    format!("{prefix}-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_sku_maps_unique_violation_to_conflict() {
    let Some((items, _)) = connect().await else { return };
    let sku = unique_sku("TOM");

    items.create_item("Tomato", &sku, Unit::Kilograms).await.unwrap();
    let err = items
        .create_item("Tomato again", &sku.to_lowercase(), Unit::Pieces)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SkuAlreadyExists(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn numeric_and_enum_columns_round_trip() {
    let Some((items, ledger)) = connect().await else { return };
    let oil = items.create_item("Olive oil", &unique_sku("OIL"), Unit::Litres).await.unwrap();
    assert_eq!(oil.stock, Decimal::ZERO);

    ledger.record_movement(oil.id, MovementType::Receipt, dec!(2.5)).await.unwrap();
    ledger.record_movement(oil.id, MovementType::Sale, dec!(1)).await.unwrap();
    ledger.record_movement(oil.id, MovementType::Adjustment, dec!(-0.25)).await.unwrap();

    let stored = items.get_item(oil.id).await.unwrap();
    assert_eq!(stored.unit, Unit::Litres);
    assert_eq!(stored.stock, dec!(1.25));

    // Página de 3 com 3 movimentações: o cursor precisa buscar a página vazia seguinte.
    let history = ledger.get_item_history(oil.id).await.unwrap().collect().await.unwrap();
    let deltas: Vec<_> = history.iter().map(|m| (m.movement_type, m.quantity_delta)).collect();
    assert_eq!(
        deltas,
        vec![
            (MovementType::Receipt, dec!(2.5)),
            (MovementType::Sale, dec!(-1)),
            (MovementType::Adjustment, dec!(-0.25)),
        ]
    );
    assert!(!ledger.reconcile_item(oil.id).await.unwrap().repaired);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn row_lock_serializes_concurrent_sales() {
    let Some((items, ledger)) = connect().await else { return };
    let item_id = items.create_item("Avocado", &unique_sku("AVO"), Unit::Pieces).await.unwrap().id;
    ledger.record_movement(item_id, MovementType::Receipt, dec!(10)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..25 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.record_movement(item_id, MovementType::Sale, dec!(1)).await
        }));
    }
    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(err) => assert!(matches!(err, AppError::InsufficientStock { .. }), "{err}"),
        }
    }

    assert_eq!(sold, 10);
    assert_eq!(items.get_item(item_id).await.unwrap().stock, Decimal::ZERO);
    assert_eq!(ledger.replay_stock(item_id).await.unwrap(), Decimal::ZERO);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn stock_overflow_is_rejected_before_touching_the_row() {
    let Some((items, ledger)) = connect().await else { return };
    let item = items.create_item("Rice", &unique_sku("RIC"), Unit::Kilograms).await.unwrap();
    ledger.record_movement(item.id, MovementType::Receipt, Decimal::MAX).await.unwrap();

    let err = ledger.record_movement(item.id, MovementType::Receipt, dec!(1)).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(items.get_item(item.id).await.unwrap().stock, Decimal::MAX);
}
