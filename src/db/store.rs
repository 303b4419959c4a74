// src/db/store.rs

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::inventory::{Item, ItemId, Movement, MovementId, MovementType, NewItem},
};

/// Persistência de itens e do livro-razão.
///
/// Toda escrita que mexe no saldo passa por um [`ItemWriteTx`], que segura o
/// lock exclusivo do item até `commit` (ou até ser descartado, o que equivale a
/// rollback). Itens diferentes não disputam o mesmo lock.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insere o item com saldo zero. Falha com `SkuAlreadyExists` se `sku_key` já existir.
    async fn insert_item(&self, new_item: NewItem) -> Result<Item, AppError>;

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, AppError>;

    /// Todos os itens, em ordem de criação.
    async fn list_items(&self) -> Result<Vec<Item>, AppError>;

    /// Abre a transação de escrita do item. Falha com `ItemNotFound`.
    async fn lock_item(&self, id: ItemId) -> Result<Box<dyn ItemWriteTx>, AppError>;

    /// Página do histórico em ordem crescente de id (keyset: `id > after`).
    async fn movements_page(
        &self,
        item_id: ItemId,
        after: Option<MovementId>,
        limit: usize,
    ) -> Result<Vec<Movement>, AppError>;

    /// As últimas `limit` movimentações, devolvidas em ordem crescente de id.
    async fn recent_movements(&self, item_id: ItemId, limit: usize) -> Result<Vec<Movement>, AppError>;
}

#[async_trait]
pub trait ItemWriteTx: Send {
    /// Estado do item visto dentro da transação (já com deltas aplicados).
    fn item(&self) -> &Item;

    /// Único caminho de mutação do saldo.
    async fn apply_stock_delta(&mut self, delta: Decimal) -> Result<Item, AppError>;

    async fn append_movement(
        &mut self,
        movement_type: MovementType,
        quantity_delta: Decimal,
    ) -> Result<Movement, AppError>;

    /// Soma de todos os deltas do item, incluindo os ainda não confirmados.
    async fn ledger_sum(&mut self) -> Result<Decimal, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
