// src/services/ledger_service.rs

use std::collections::VecDeque;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::InventoryStore,
    models::inventory::{stock_after, Item, ItemId, Movement, MovementId, MovementType, ReconcileReport},
};

/// Livro-razão de movimentações. Fonte da verdade do saldo.
#[derive(Clone)]
pub struct MovementLedger {
    store: Arc<dyn InventoryStore>,
    allow_negative_stock: bool,
    history_page_size: usize,
}

impl MovementLedger {
    pub fn new(store: Arc<dyn InventoryStore>, allow_negative_stock: bool, history_page_size: usize) -> Self {
        Self {
            store,
            allow_negative_stock,
            history_page_size: history_page_size.max(1),
        }
    }

    // --- RECORD MOVEMENT ---
    /// Grava a movimentação e aplica o delta no saldo na mesma transação.
    /// Devolve o item já atualizado junto com a movimentação criada.
    #[tracing::instrument(skip(self))]
    pub async fn record_movement(
        &self,
        item_id: ItemId,
        movement_type: MovementType,
        quantity: Decimal,
    ) -> Result<(Movement, Item), AppError> {
        let delta = movement_type
            .signed_delta(quantity)
            .map_err(|e| AppError::field("quantity", e))?;

        // 1. Lock exclusivo do item (até commit ou drop)
        let mut tx = self.store.lock_item(item_id).await?;

        // 2. Saldo resultante precisa caber no Decimal
        let available = tx.item().stock;
        let new_stock = stock_after(available, delta).map_err(|e| AppError::field("quantity", e))?;

        // 3. Política de saldo negativo (só para vendas)
        if movement_type == MovementType::Sale && !self.allow_negative_stock && new_stock < Decimal::ZERO {
            tracing::warn!(item_id, %available, requested = %quantity, "sale rejected: insufficient stock");
            return Err(AppError::InsufficientStock {
                item_id,
                available,
                requested: quantity,
            });
        }

        // 4. Livro-razão + saldo, tudo ou nada
        let movement = tx.append_movement(movement_type, delta).await?;
        let item = tx.apply_stock_delta(delta).await?;
        tx.commit().await?;

        tracing::info!(item_id, movement_id = movement.id, %delta, stock = %item.stock, "movement recorded");
        Ok((movement, item))
    }

    /// Histórico completo do item, lido sob demanda em páginas.
    pub async fn get_item_history(&self, item_id: ItemId) -> Result<MovementHistory, AppError> {
        if self.store.find_item(item_id).await?.is_none() {
            return Err(AppError::ItemNotFound(item_id));
        }
        Ok(MovementHistory::new(Arc::clone(&self.store), item_id, self.history_page_size))
    }

    /// Uma página do histórico (keyset por id).
    pub async fn history_page(
        &self,
        item_id: ItemId,
        after: Option<MovementId>,
        limit: usize,
    ) -> Result<Vec<Movement>, AppError> {
        self.store.movements_page(item_id, after, limit).await
    }

    // --- RECONCILIAÇÃO ---

    /// Recalcula o saldo somando o histórico. Só leitura.
    pub async fn replay_stock(&self, item_id: ItemId) -> Result<Decimal, AppError> {
        let mut history = self.get_item_history(item_id).await?;
        let mut stock = Decimal::ZERO;
        while let Some(movement) = history.next().await? {
            stock = stock
                .checked_add(movement.quantity_delta)
                .ok_or_else(|| anyhow::anyhow!("ledger of item {item_id} overflows"))?;
        }
        Ok(stock)
    }

    /// Compara o saldo gravado com o livro-razão e corrige a divergência, se houver.
    /// Roda sob o lock do item, então nenhuma movimentação entra no meio.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_item(&self, item_id: ItemId) -> Result<ReconcileReport, AppError> {
        let mut tx = self.store.lock_item(item_id).await?;
        let recorded_stock = tx.item().stock;
        let ledger_stock = tx.ledger_sum().await?;

        let drift = ledger_stock
            .checked_sub(recorded_stock)
            .ok_or_else(|| anyhow::anyhow!("stock drift of item {item_id} is out of range"))?;
        let repaired = !drift.is_zero();
        if repaired {
            tracing::warn!(item_id, %recorded_stock, %ledger_stock, "stock drift detected, repairing from ledger");
            tx.apply_stock_delta(drift).await?;
            tx.commit().await?;
        }

        Ok(ReconcileReport {
            item_id,
            recorded_stock,
            ledger_stock,
            repaired,
        })
    }

    pub async fn reconcile_all(&self) -> Result<Vec<ReconcileReport>, AppError> {
        let items = self.store.list_items().await?;
        let mut reports = Vec::with_capacity(items.len());
        for item in items {
            reports.push(self.reconcile_item(item.id).await?);
        }
        Ok(reports)
    }
}

/// Cursor preguiçoso sobre o histórico de um item, em ordem crescente de id.
///
/// Busca uma página por vez no store. Termina quando uma página vem incompleta;
/// `restart` volta para o início.
pub struct MovementHistory {
    store: Arc<dyn InventoryStore>,
    item_id: ItemId,
    page_size: usize,
    last_seen: Option<MovementId>,
    buffer: VecDeque<Movement>,
    exhausted: bool,
}

impl MovementHistory {
    fn new(store: Arc<dyn InventoryStore>, item_id: ItemId, page_size: usize) -> Self {
        Self {
            store,
            item_id,
            page_size,
            last_seen: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub async fn next(&mut self) -> Result<Option<Movement>, AppError> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = self
                .store
                .movements_page(self.item_id, self.last_seen, self.page_size)
                .await?;
            if page.len() < self.page_size {
                self.exhausted = true;
            }
            self.buffer.extend(page);
        }

        let next = self.buffer.pop_front();
        if let Some(movement) = &next {
            self.last_seen = Some(movement.id);
        }
        Ok(next)
    }

    pub fn restart(&mut self) {
        self.last_seen = None;
        self.buffer.clear();
        self.exhausted = false;
    }

    pub async fn collect(mut self) -> Result<Vec<Movement>, AppError> {
        let mut movements = Vec::new();
        while let Some(movement) = self.next().await? {
            movements.push(movement);
        }
        Ok(movements)
    }
}
