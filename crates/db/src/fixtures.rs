use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::info;

use crate::connection::DbPool;
use crate::repositories::{timestamp, RepositoryError};
use wardrobe_core::catalog::pool::PRODUCT_POOL;
use wardrobe_core::catalog::{DatasetRow, ProductRecord};
use wardrobe_core::domain::product::ProductId;

pub const DEMO_USER_ID: &str = "demo-user";
pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_EMAIL: &str = "demo@wardrobe.test";
pub const DEMO_CITY: &str = "London";

/// Storefront seed: a demo shopper, the labelled t-shirt dataset, and an
/// id-only row for every pool product the dataset does not describe, so
/// cart and wishlist writes accept every product the catalog can show.
pub struct StorefrontSeed;

impl StorefrontSeed {
    /// Labelled dataset rows, as the product endpoint serves them.
    pub const DATASET_JSON: &str = include_str!("../../../config/fixtures/tshirt_dataset.json");

    pub fn dataset_rows() -> Result<Vec<DatasetRow>, RepositoryError> {
        serde_json::from_str(Self::DATASET_JSON)
            .map_err(|error| RepositoryError::Decode(format!("seed dataset: {error}")))
    }

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let rows = Self::dataset_rows()?;
        let described = described_ids(&rows)?;
        let now = timestamp(seed_time());

        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO app_user (id, username, email, city, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET city = excluded.city, updated_at = excluded.updated_at",
        )
        .bind(DEMO_USER_ID)
        .bind(DEMO_USERNAME)
        .bind(DEMO_EMAIL)
        .bind(DEMO_CITY)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for row in &rows {
            let product_id = parse_id(&row.product_id)?;
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
            .execute(&mut *tx)
            .await?;
        }

        let mut placeholder_rows = 0;
        for id in PRODUCT_POOL.iter().filter(|id| !described.contains(*id)) {
            let inserted = sqlx::query("INSERT OR IGNORE INTO product (product_id) VALUES (?)")
                .bind(i64::from(*id))
                .execute(&mut *tx)
                .await?;
            placeholder_rows += inserted.rows_affected() as usize;
        }

        tx.commit().await?;
        info!(
            event_name = "db.seed.loaded",
            dataset_rows = rows.len(),
            placeholder_rows,
            "storefront seed loaded"
        );

        Ok(SeedResult {
            user_id: DEMO_USER_ID,
            dataset_rows: rows.len(),
            placeholder_rows,
        })
    }

    /// Verify that seed data exists and matches the dataset file.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let rows = Self::dataset_rows()?;
        let mut checks = Vec::new();

        let user_ok: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM app_user WHERE id = ?1 AND email = ?2 AND city = ?3)",
        )
        .bind(DEMO_USER_ID)
        .bind(DEMO_EMAIL)
        .bind(DEMO_CITY)
        .fetch_one(pool)
        .await?;
        checks.push(("demo-user", user_ok == 1));

        let mut names_match = true;
        for row in &rows {
            let product_id = parse_id(&row.product_id)?;
            let stored: Option<Option<String>> =
                sqlx::query_scalar("SELECT product_name FROM product WHERE product_id = ?")
                    .bind(i64::from(product_id.0))
                    .fetch_optional(pool)
                    .await?;
            if stored != Some(row.product_name.clone()) {
                names_match = false;
            }
        }
        checks.push(("dataset-rows", names_match));

        let stored_ids: Vec<i64> = sqlx::query_scalar("SELECT product_id FROM product")
            .fetch_all(pool)
            .await?;
        let stored_ids = stored_ids.into_iter().collect::<HashSet<_>>();
        let pool_covered = PRODUCT_POOL.iter().all(|id| stored_ids.contains(&i64::from(*id)));
        checks.push(("pool-coverage", pool_covered));

        let typed = rows.into_iter().all(|row| ProductRecord::from_row(row).is_ok());
        checks.push(("dataset-typed", typed));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the demo shopper and their cart and wishlist. Products stay,
    /// since other shoppers may reference them.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM cart_item WHERE user_id = ?")
            .bind(DEMO_USER_ID)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM wishlist_item WHERE user_id = ?")
            .bind(DEMO_USER_ID)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM app_user WHERE id = ?")
            .bind(DEMO_USER_ID)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

fn seed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now)
}

fn parse_id(raw: &str) -> Result<ProductId, RepositoryError> {
    raw.parse::<ProductId>().map_err(|error| RepositoryError::Decode(error.to_string()))
}

fn described_ids(rows: &[DatasetRow]) -> Result<HashSet<u32>, RepositoryError> {
    rows.iter().map(|row| parse_id(&row.product_id).map(|id| id.0)).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedResult {
    pub user_id: &'static str,
    pub dataset_rows: usize,
    pub placeholder_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::{StorefrontSeed, DEMO_USER_ID};
    use crate::repositories::{SqlProductRepository, SqlUserRepository, UserRepository};
    use crate::{connect_with_settings, migrations};
    use wardrobe_core::catalog::pool::PRODUCT_POOL;
    use wardrobe_core::catalog::ProductSource;
    use wardrobe_core::domain::cart::UserId;

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn verify_fails_before_load_and_passes_after() {
        let pool = setup().await;

        let before = StorefrontSeed::verify(&pool).await.expect("verify");
        assert!(!before.all_present);

        let seeded = StorefrontSeed::load(&pool).await.expect("load");
        assert!(seeded.dataset_rows > 0);
        assert_eq!(seeded.dataset_rows + seeded.placeholder_rows, PRODUCT_POOL.len());

        let after = StorefrontSeed::verify(&pool).await.expect("verify");
        assert!(after.all_present, "checks: {:?}", after.checks);
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let pool = setup().await;
        StorefrontSeed::load(&pool).await.expect("first load");
        let second = StorefrontSeed::load(&pool).await.expect("second load");

        assert_eq!(second.placeholder_rows, 0);
        let products = SqlProductRepository::new(pool).fetch_all().await.expect("fetch");
        assert_eq!(products.len(), PRODUCT_POOL.len());
    }

    #[tokio::test]
    async fn clean_removes_demo_user() {
        let pool = setup().await;
        StorefrontSeed::load(&pool).await.expect("load");
        StorefrontSeed::clean(&pool).await.expect("clean");

        let users = SqlUserRepository::new(pool);
        let found = users.find_by_id(&UserId(DEMO_USER_ID.to_string())).await.expect("find");
        assert!(found.is_none());
    }
}
