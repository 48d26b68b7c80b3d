//! Cart and wishlist: the remote stores and the client-side mutator.

pub mod mirror;
pub mod mutator;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::cart::{CartLine, UserId, WishlistLine};
use crate::domain::product::ProductId;

pub use mirror::LocalMirror;
pub use mutator::{CartMutator, MutationOutcome};

pub const ALREADY_IN_WISHLIST: &str = "already in wishlist";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Product {ALREADY_IN_WISHLIST}")]
    AlreadyInWishlist,
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    /// Rejections that deserve a specific, friendlier message than the
    /// generic failure banner.
    pub fn is_business_rule(&self) -> bool {
        matches!(self, Self::AlreadyInWishlist)
    }
}

/// One line per (user, product); enforced by the implementation.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds `quantity` to the existing line or creates a new one.
    async fn add(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, StoreError>;

    async fn update_quantity(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, StoreError>;

    async fn remove(&self, user_id: &UserId, product_id: ProductId) -> Result<(), StoreError>;

    /// Newest lines first.
    async fn list(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError>;

    /// Returns the number of lines removed.
    async fn clear(&self, user_id: &UserId) -> Result<u64, StoreError>;
}

/// One line per (user, product); a second add fails with
/// [`StoreError::AlreadyInWishlist`].
#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn add(&self, user_id: &UserId, product_id: ProductId)
        -> Result<WishlistLine, StoreError>;

    async fn remove(&self, user_id: &UserId, product_id: ProductId) -> Result<(), StoreError>;

    async fn list(&self, user_id: &UserId) -> Result<Vec<WishlistLine>, StoreError>;
}

#[async_trait]
impl<T> CartStore for Arc<T>
where
    T: CartStore + ?Sized,
{
    async fn add(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, StoreError> {
        (**self).add(user_id, product_id, quantity).await
    }

    async fn update_quantity(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, StoreError> {
        (**self).update_quantity(user_id, product_id, quantity).await
    }

    async fn remove(&self, user_id: &UserId, product_id: ProductId) -> Result<(), StoreError> {
        (**self).remove(user_id, product_id).await
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError> {
        (**self).list(user_id).await
    }

    async fn clear(&self, user_id: &UserId) -> Result<u64, StoreError> {
        (**self).clear(user_id).await
    }
}

#[async_trait]
impl<T> WishlistStore for Arc<T>
where
    T: WishlistStore + ?Sized,
{
    async fn add(
        &self,
        user_id: &UserId,
        product_id: ProductId,
    ) -> Result<WishlistLine, StoreError> {
        (**self).add(user_id, product_id).await
    }

    async fn remove(&self, user_id: &UserId, product_id: ProductId) -> Result<(), StoreError> {
        (**self).remove(user_id, product_id).await
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<WishlistLine>, StoreError> {
        (**self).list(user_id).await
    }
}
