use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use wardrobe_core::cart::{StoreError, WishlistStore};
use wardrobe_core::domain::cart::{UserId, WishlistLine};
use wardrobe_core::domain::product::ProductId;

use super::{
    decode_product_id, ensure_product, ensure_user, parse_timestamp, timestamp, RepositoryError,
};
use crate::DbPool;

pub struct SqlWishlistRepository {
    pool: DbPool,
}

impl SqlWishlistRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<WishlistLine, RepositoryError> {
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_id: i64 =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let added_at: String =
        row.try_get("added_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(WishlistLine {
        user_id: UserId(user_id),
        product_id: decode_product_id(product_id)?,
        added_at: parse_timestamp(&added_at)?,
    })
}

#[async_trait]
impl WishlistStore for SqlWishlistRepository {
    async fn add(
        &self,
        user_id: &UserId,
        product_id: ProductId,
    ) -> Result<WishlistLine, StoreError> {
        ensure_user(&self.pool, user_id).await?;
        ensure_product(&self.pool, product_id).await?;

        let added_at = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO wishlist_item (user_id, product_id, added_at) VALUES (?, ?, ?)",
        )
        .bind(&user_id.0)
        .bind(i64::from(product_id.0))
        .bind(timestamp(added_at))
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(WishlistLine { user_id: user_id.clone(), product_id, added_at }),
            Err(sqlx::Error::Database(error)) if error.is_unique_violation() => {
                Err(StoreError::AlreadyInWishlist)
            }
            Err(error) => Err(RepositoryError::from(error).into()),
        }
    }

    async fn remove(&self, user_id: &UserId, product_id: ProductId) -> Result<(), StoreError> {
        ensure_user(&self.pool, user_id).await?;

        let result = sqlx::query("DELETE FROM wishlist_item WHERE user_id = ? AND product_id = ?")
            .bind(&user_id.0)
            .bind(i64::from(product_id.0))
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "wishlist item" });
        }
        Ok(())
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<WishlistLine>, StoreError> {
        ensure_user(&self.pool, user_id).await?;

        let rows = sqlx::query(
            "SELECT user_id, product_id, added_at
             FROM wishlist_item WHERE user_id = ?
             ORDER BY added_at DESC, id DESC",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows.iter().map(row_to_line).collect::<Result<Vec<_>, _>>()?)
    }
}
