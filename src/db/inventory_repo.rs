// src/db/inventory_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::store::{InventoryStore, ItemWriteTx},
    models::inventory::{stock_after, Item, ItemId, Movement, MovementId, MovementType, NewItem},
};

const ITEM_COLUMNS: &str = "id, name, sku, unit, stock";
const MOVEMENT_COLUMNS: &str = "id, item_id, movement_type, quantity_delta, created_at";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for InventoryRepository {
    async fn insert_item(&self, new_item: NewItem) -> Result<Item, AppError> {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (name, sku, sku_key, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&new_item.name)
        .bind(&new_item.sku)
        .bind(&new_item.sku_key)
        .bind(new_item.unit)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Converte violação de chave única em conflito de SKU
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::SkuAlreadyExists(new_item.sku.clone());
                }
            }
            e.into()
        })
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        let items = sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn lock_item(&self, id: ItemId) -> Result<Box<dyn ItemWriteTx>, AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE: serializa as escritas concorrentes no mesmo item até o commit.
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::ItemNotFound(id))?;

        Ok(Box::new(PgItemTx { tx, item }))
    }

    async fn movements_page(
        &self,
        item_id: ItemId,
        after: Option<MovementId>,
        limit: usize,
    ) -> Result<Vec<Movement>, AppError> {
        self.ensure_item(item_id).await?;

        let movements = sqlx::query_as::<_, Movement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM movements
            WHERE item_id = $1 AND id > $2
            ORDER BY id ASC
            LIMIT $3
            "#
        ))
        .bind(item_id)
        .bind(after.unwrap_or(0))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }

    async fn recent_movements(&self, item_id: ItemId, limit: usize) -> Result<Vec<Movement>, AppError> {
        self.ensure_item(item_id).await?;

        let mut movements = sqlx::query_as::<_, Movement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM movements
            WHERE item_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#
        ))
        .bind(item_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        movements.reverse();
        Ok(movements)
    }
}

impl InventoryRepository {
    async fn ensure_item(&self, id: ItemId) -> Result<(), AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM items WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if exists { Ok(()) } else { Err(AppError::ItemNotFound(id)) }
    }
}

// Drop da `Transaction` sem commit faz rollback automático.
struct PgItemTx {
    tx: Transaction<'static, Postgres>,
    item: Item,
}

#[async_trait]
impl ItemWriteTx for PgItemTx {
    fn item(&self) -> &Item {
        &self.item
    }

    async fn apply_stock_delta(&mut self, delta: Decimal) -> Result<Item, AppError> {
        // NUMERIC aceitaria, mas o valor não voltaria a caber no Decimal.
        stock_after(self.item.stock, delta).map_err(|e| AppError::field("quantity", e))?;

        let item = sqlx::query_as::<_, Item>(&format!(
            "UPDATE items SET stock = stock + $2 WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(self.item.id)
        .bind(delta)
        .fetch_one(&mut *self.tx)
        .await?;

        self.item = item.clone();
        Ok(item)
    }

    async fn append_movement(
        &mut self,
        movement_type: MovementType,
        quantity_delta: Decimal,
    ) -> Result<Movement, AppError> {
        let movement = sqlx::query_as::<_, Movement>(&format!(
            r#"
            INSERT INTO movements (item_id, movement_type, quantity_delta)
            VALUES ($1, $2, $3)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(self.item.id)
        .bind(movement_type)
        .bind(quantity_delta)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(movement)
    }

    async fn ledger_sum(&mut self) -> Result<Decimal, AppError> {
        let sum: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_delta), 0) FROM movements WHERE item_id = $1",
        )
        .bind(self.item.id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(sum)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
