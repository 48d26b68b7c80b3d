use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use wardrobe_core::cart::{CartStore, StoreError};
use wardrobe_core::domain::cart::{CartLine, UserId};
use wardrobe_core::domain::product::ProductId;

use super::{
    decode_product_id, decode_quantity, ensure_product, ensure_user, parse_timestamp, timestamp,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlCartRepository {
    pool: DbPool,
}

impl SqlCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, product_id, quantity, added_at
             FROM cart_item WHERE user_id = ? AND product_id = ?",
        )
        .bind(&user_id.0)
        .bind(i64::from(product_id.0))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_line).transpose()
    }
}

fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<CartLine, RepositoryError> {
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_id: i64 =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let added_at: String =
        row.try_get("added_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(CartLine {
        user_id: UserId(user_id),
        product_id: decode_product_id(product_id)?,
        quantity: decode_quantity(quantity)?,
        added_at: parse_timestamp(&added_at)?,
    })
}

fn positive(quantity: u32) -> Result<i64, StoreError> {
    if quantity == 0 {
        return Err(StoreError::Invalid("quantity must be at least 1".to_string()));
    }
    Ok(i64::from(quantity))
}

#[async_trait]
impl CartStore for SqlCartRepository {
    async fn add(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, StoreError> {
        let quantity = positive(quantity)?;
        ensure_user(&self.pool, user_id).await?;
        ensure_product(&self.pool, product_id).await?;

        let now = timestamp(Utc::now());
        sqlx::query(
            "INSERT INTO cart_item (user_id, product_id, quantity, added_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id, product_id) DO UPDATE SET
                 quantity = cart_item.quantity + excluded.quantity,
                 updated_at = excluded.updated_at",
        )
        .bind(&user_id.0)
        .bind(i64::from(product_id.0))
        .bind(quantity)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        self.find_line(user_id, product_id)
            .await?
            .ok_or(StoreError::NotFound { entity: "cart item" })
    }

    async fn update_quantity(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, StoreError> {
        let quantity = positive(quantity)?;
        ensure_user(&self.pool, user_id).await?;

        let result = sqlx::query(
            "UPDATE cart_item SET quantity = ?, updated_at = ? WHERE user_id = ? AND product_id = ?",
        )
        .bind(quantity)
        .bind(timestamp(Utc::now()))
        .bind(&user_id.0)
        .bind(i64::from(product_id.0))
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "cart item" });
        }
        self.find_line(user_id, product_id)
            .await?
            .ok_or(StoreError::NotFound { entity: "cart item" })
    }

    async fn remove(&self, user_id: &UserId, product_id: ProductId) -> Result<(), StoreError> {
        ensure_user(&self.pool, user_id).await?;

        let result = sqlx::query("DELETE FROM cart_item WHERE user_id = ? AND product_id = ?")
            .bind(&user_id.0)
            .bind(i64::from(product_id.0))
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "cart item" });
        }
        Ok(())
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError> {
        ensure_user(&self.pool, user_id).await?;

        let rows = sqlx::query(
            "SELECT user_id, product_id, quantity, added_at
             FROM cart_item WHERE user_id = ?
             ORDER BY added_at DESC, id DESC",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows.iter().map(row_to_line).collect::<Result<Vec<_>, _>>()?)
    }

    async fn clear(&self, user_id: &UserId) -> Result<u64, StoreError> {
        ensure_user(&self.pool, user_id).await?;

        let result = sqlx::query("DELETE FROM cart_item WHERE user_id = ?")
            .bind(&user_id.0)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        Ok(result.rows_affected())
    }
}
