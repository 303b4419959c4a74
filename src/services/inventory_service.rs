// src/services/inventory_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::InventoryStore,
    models::inventory::{Item, ItemDetail, ItemId, NewItem, Unit},
};

/// Catálogo de itens. O saldo só muda via `apply_stock_delta`.
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
    sku_case_sensitive: bool,
    recent_movements_limit: usize,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>, sku_case_sensitive: bool, recent_movements_limit: usize) -> Self {
        Self {
            store,
            sku_case_sensitive,
            recent_movements_limit,
        }
    }

    // --- CREATE ITEM ---
    #[tracing::instrument(skip(self))]
    pub async fn create_item(&self, name: &str, sku: &str, unit: Unit) -> Result<Item, AppError> {
        let new_item = NewItem::new(name, sku, unit, self.sku_case_sensitive);
        new_item.validate()?;

        let item = self.store.insert_item(new_item).await?;
        tracing::info!(item_id = item.id, sku = %item.sku, "item created");
        Ok(item)
    }

    pub async fn get_item(&self, id: ItemId) -> Result<Item, AppError> {
        self.store
            .find_item(id)
            .await?
            .ok_or(AppError::ItemNotFound(id))
    }

    /// Item + as últimas movimentações (ordem crescente de id).
    pub async fn get_item_detail(&self, id: ItemId) -> Result<ItemDetail, AppError> {
        let item = self.get_item(id).await?;
        let movements = self
            .store
            .recent_movements(id, self.recent_movements_limit)
            .await?;
        Ok(ItemDetail { item, movements })
    }

    pub async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        self.store.list_items().await
    }

    pub async fn list_low_stock_items(&self) -> Result<Vec<Item>, AppError> {
        let items = self.store.list_items().await?;
        Ok(items.into_iter().filter(Item::is_low_stock).collect())
    }

    /// Aplica um delta isolado, sem registrar movimentação.
    /// O fluxo normal passa pelo `MovementLedger`, que faz isso dentro da própria transação.
    #[tracing::instrument(skip(self))]
    pub async fn apply_stock_delta(&self, item_id: ItemId, delta: Decimal) -> Result<Item, AppError> {
        let mut tx = self.store.lock_item(item_id).await?;
        let item = tx.apply_stock_delta(delta).await?;
        tx.commit().await?;
        Ok(item)
    }
}
