// src/db/memory_repo.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    common::error::AppError,
    db::store::{InventoryStore, ItemWriteTx},
    models::inventory::{stock_after, Item, ItemId, Movement, MovementId, MovementType, NewItem},
};

// Cada item tem o próprio lock, guardando saldo e histórico juntos.
#[derive(Debug)]
struct ItemCell {
    item: Item,
    movements: Vec<Movement>,
}

#[derive(Debug, Default)]
struct Catalog {
    // Posição no vetor = id - 1 (ordem de criação).
    items: Vec<Arc<Mutex<ItemCell>>>,
    sku_index: HashMap<String, ItemId>,
}

/// Store em memória. Usado quando `DATABASE_URL` não está definida e nos testes.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    catalog: RwLock<Catalog>,
    last_movement_id: Arc<AtomicI64>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, id: ItemId) -> Result<Option<Arc<Mutex<ItemCell>>>, AppError> {
        let catalog = self.catalog.read().map_err(|_| lock_poisoned())?;
        if id < 1 {
            return Ok(None);
        }
        Ok(catalog.items.get((id - 1) as usize).cloned())
    }

    fn existing_cell(&self, id: ItemId) -> Result<Arc<Mutex<ItemCell>>, AppError> {
        self.cell(id)?.ok_or(AppError::ItemNotFound(id))
    }
}

fn lock_poisoned() -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("inventory catalog lock poisoned"))
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn insert_item(&self, new_item: NewItem) -> Result<Item, AppError> {
        let mut catalog = self.catalog.write().map_err(|_| lock_poisoned())?;

        if catalog.sku_index.contains_key(&new_item.sku_key) {
            return Err(AppError::SkuAlreadyExists(new_item.sku));
        }

        let item = Item {
            id: catalog.items.len() as ItemId + 1,
            name: new_item.name,
            sku: new_item.sku,
            unit: new_item.unit,
            stock: Decimal::ZERO,
        };

        catalog.sku_index.insert(new_item.sku_key, item.id);
        catalog.items.push(Arc::new(Mutex::new(ItemCell {
            item: item.clone(),
            movements: Vec::new(),
        })));

        Ok(item)
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, AppError> {
        match self.cell(id)? {
            Some(cell) => Ok(Some(cell.lock().await.item.clone())),
            None => Ok(None),
        }
    }

    async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        // Clona os handles e solta o lock do catálogo antes de aguardar os itens.
        let cells = self.catalog.read().map_err(|_| lock_poisoned())?.items.clone();

        let mut items = Vec::with_capacity(cells.len());
        for cell in cells {
            items.push(cell.lock().await.item.clone());
        }
        Ok(items)
    }

    async fn lock_item(&self, id: ItemId) -> Result<Box<dyn ItemWriteTx>, AppError> {
        let guard = self.existing_cell(id)?.lock_owned().await;
        let item = guard.item.clone();

        Ok(Box::new(InMemoryItemTx {
            guard,
            item,
            staged: Vec::new(),
            last_movement_id: Arc::clone(&self.last_movement_id),
        }))
    }

    async fn movements_page(
        &self,
        item_id: ItemId,
        after: Option<MovementId>,
        limit: usize,
    ) -> Result<Vec<Movement>, AppError> {
        let cell = self.existing_cell(item_id)?;
        let cell = cell.lock().await;
        let after = after.unwrap_or(0);

        Ok(cell
            .movements
            .iter()
            .filter(|m| m.id > after)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recent_movements(&self, item_id: ItemId, limit: usize) -> Result<Vec<Movement>, AppError> {
        let cell = self.existing_cell(item_id)?;
        let cell = cell.lock().await;
        let skip = cell.movements.len().saturating_sub(limit);
        Ok(cell.movements[skip..].to_vec())
    }
}

/// Transação em memória: as mudanças ficam em `item`/`staged` e só são
/// publicadas na célula em `commit`. Drop sem commit descarta tudo.
struct InMemoryItemTx {
    guard: OwnedMutexGuard<ItemCell>,
    item: Item,
    staged: Vec<Movement>,
    last_movement_id: Arc<AtomicI64>,
}

#[async_trait]
impl ItemWriteTx for InMemoryItemTx {
    fn item(&self) -> &Item {
        &self.item
    }

    async fn apply_stock_delta(&mut self, delta: Decimal) -> Result<Item, AppError> {
        self.item.stock = stock_after(self.item.stock, delta).map_err(|e| AppError::field("quantity", e))?;
        Ok(self.item.clone())
    }

    async fn append_movement(
        &mut self,
        movement_type: MovementType,
        quantity_delta: Decimal,
    ) -> Result<Movement, AppError> {
        // Alocado com o lock do item seguro: ids crescentes dentro de cada item.
        let id = self.last_movement_id.fetch_add(1, Ordering::SeqCst) + 1;
        let movement = Movement {
            id,
            item_id: self.item.id,
            movement_type,
            quantity_delta,
            created_at: Utc::now(),
        };
        self.staged.push(movement.clone());
        Ok(movement)
    }

    async fn ledger_sum(&mut self) -> Result<Decimal, AppError> {
        self.guard
            .movements
            .iter()
            .chain(self.staged.iter())
            .try_fold(Decimal::ZERO, |sum, m| sum.checked_add(m.quantity_delta))
            .ok_or_else(|| AppError::InternalServerError(anyhow::anyhow!("ledger of item {} overflows", self.item.id)))
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let InMemoryItemTx {
            mut guard,
            item,
            staged,
            ..
        } = *self;
        guard.item = item;
        guard.movements.extend(staged);
        Ok(())
    }
}
