use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use wardrobe_core::cart::StoreError;
use wardrobe_core::catalog::{CatalogError, DatasetRow};
use wardrobe_core::domain::cart::UserId;
use wardrobe_core::domain::product::ProductId;

pub mod cart;
pub mod product;
pub mod user;
pub mod wishlist;

pub use cart::SqlCartRepository;
pub use product::SqlProductRepository;
pub use user::{SqlUserRepository, UserRecord};
pub use wishlist::SqlWishlistRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        StoreError::Storage(error.to_string())
    }
}

impl From<RepositoryError> for CatalogError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(error) => CatalogError::SourceUnavailable(error.to_string()),
            RepositoryError::Decode(message) => CatalogError::Malformed(message),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;
    async fn save(&self, user: UserRecord) -> Result<(), RepositoryError>;
    /// Inserts a new user. Returns `false` when the username or email is
    /// already taken.
    async fn create(&self, user: &UserRecord) -> Result<bool, RepositoryError>;
    /// Returns `false` when the user does not exist.
    async fn update_city(&self, id: &UserId, city: &str) -> Result<bool, RepositoryError>;
}

/// The persisted product dataset, kept in its labelled row form.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_rows(&self) -> Result<Vec<DatasetRow>, RepositoryError>;
    async fn find_row(&self, id: ProductId) -> Result<Option<DatasetRow>, RepositoryError>;
    async fn save_row(&self, row: DatasetRow) -> Result<(), RepositoryError>;
}

pub(crate) fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{value}`: {error}")))
}

pub(crate) fn decode_quantity(value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .ok()
        .filter(|quantity| *quantity >= 1)
        .ok_or_else(|| RepositoryError::Decode(format!("invalid cart quantity {value}")))
}

pub(crate) fn decode_product_id(value: i64) -> Result<ProductId, RepositoryError> {
    u32::try_from(value)
        .map(ProductId)
        .map_err(|_| RepositoryError::Decode(format!("invalid product id {value}")))
}

pub(crate) async fn ensure_user(pool: &crate::DbPool, user_id: &UserId) -> Result<(), StoreError> {
    let found = sqlx::query("SELECT 1 FROM app_user WHERE id = ?")
        .bind(&user_id.0)
        .fetch_optional(pool)
        .await
        .map_err(RepositoryError::from)?;
    found.map(|_| ()).ok_or(StoreError::NotFound { entity: "user" })
}

pub(crate) async fn ensure_product(
    pool: &crate::DbPool,
    product_id: ProductId,
) -> Result<(), StoreError> {
    let found = sqlx::query("SELECT 1 FROM product WHERE product_id = ?")
        .bind(i64::from(product_id.0))
        .fetch_optional(pool)
        .await
        .map_err(RepositoryError::from)?;
    found.map(|_| ()).ok_or(StoreError::NotFound { entity: "product" })
}
