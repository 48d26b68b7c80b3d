use sqlx::Row;

use wardrobe_core::catalog::dataset::records_from_rows;
use wardrobe_core::catalog::{CatalogError, DatasetRow, ProductRecord, ProductSource};
use wardrobe_core::domain::product::ProductId;

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "product_id, product_name, category, color, size, fabric, fit_type,
     price, availability, user_ratings, description, keywords";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_dataset_row(row: &sqlx::sqlite::SqliteRow) -> Result<DatasetRow, RepositoryError> {
    let text = |column: &str| -> Result<Option<String>, RepositoryError> {
        row.try_get::<Option<String>, _>(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };
    let product_id: i64 =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(DatasetRow {
        product_id: product_id.to_string(),
        product_name: text("product_name")?,
        category: text("category")?,
        color: text("color")?,
        size: text("size")?,
        fabric: text("fabric")?,
        fit_type: text("fit_type")?,
        price: text("price")?,
        availability: text("availability")?,
        user_ratings: text("user_ratings")?,
        description: text("description")?,
        keywords: text("keywords")?,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list_rows(&self) -> Result<Vec<DatasetRow>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY product_id"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_dataset_row).collect()
    }

    async fn find_row(&self, id: ProductId) -> Result<Option<DatasetRow>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE product_id = ?"))
            .bind(i64::from(id.0))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_dataset_row).transpose()
    }

    async fn save_row(&self, row: DatasetRow) -> Result<(), RepositoryError> {
        let product_id = row
            .product_id
            .parse::<ProductId>()
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        sqlx::query(
            "INSERT INTO product (product_id, product_name, category, color, size, fabric,
                                  fit_type, price, availability, user_ratings, description, keywords)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(product_id) DO UPDATE SET
                 product_name = excluded.product_name,
                 category = excluded.category,
                 color = excluded.color,
                 size = excluded.size,
                 fabric = excluded.fabric,
                 fit_type = excluded.fit_type,
                 price = excluded.price,
                 availability = excluded.availability,
                 user_ratings = excluded.user_ratings,
                 description = excluded.description,
                 keywords = excluded.keywords",
        )
        .bind(i64::from(product_id.0))
        .bind(&row.product_name)
        .bind(&row.category)
        .bind(&row.color)
        .bind(&row.size)
        .bind(&row.fabric)
        .bind(&row.fit_type)
        .bind(&row.price)
        .bind(&row.availability)
        .bind(&row.user_ratings)
        .bind(&row.description)
        .bind(&row.keywords)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductSource for SqlProductRepository {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        let rows = self.list_rows().await?;
        Ok(records_from_rows(rows))
    }
}
