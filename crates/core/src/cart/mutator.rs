use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cart::{CartStore, LocalMirror, StoreError, WishlistStore};
use crate::domain::cart::{CartLine, UserId, WishlistLine};
use crate::domain::product::ProductId;
use crate::session::SessionContext;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to continue.";
pub const ALREADY_IN_WISHLIST_NOTICE: &str = "This product is already in your wishlist!";

/// Result of one cart or wishlist action, ready to show to the shopper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    Applied { message: String },
    /// Nothing was sent; the caller should route to the login page.
    LoginRequired,
    /// The store declined for a business reason the shopper can act on.
    Notice { message: String },
    /// Rejected before reaching the store.
    Invalid { message: String },
    Failed { message: String },
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::Applied { message }
            | Self::Notice { message }
            | Self::Invalid { message }
            | Self::Failed { message } => message,
            Self::LoginRequired => LOGIN_REQUIRED_MESSAGE,
        }
    }
}

/// Sends cart and wishlist changes for the logged-in shopper.
///
/// Each action is a single attempt. Failures are reported, never retried,
/// and any failed cart write drops the mirror back to stale.
pub struct CartMutator<C, W> {
    cart: C,
    wishlist: W,
    session: Arc<SessionContext>,
    mirror: Mutex<LocalMirror>,
}

impl<C, W> CartMutator<C, W>
where
    C: CartStore,
    W: WishlistStore,
{
    pub fn new(cart: C, wishlist: W, session: Arc<SessionContext>) -> Self {
        Self::with_mirror(cart, wishlist, session, LocalMirror::default())
    }

    pub fn with_mirror(
        cart: C,
        wishlist: W,
        session: Arc<SessionContext>,
        mirror: LocalMirror,
    ) -> Self {
        Self { cart, wishlist, session, mirror: Mutex::new(mirror) }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> MutationOutcome {
        let Some(user_id) = self.session.user_id() else {
            return MutationOutcome::LoginRequired;
        };
        if quantity == 0 {
            return MutationOutcome::Invalid { message: "Quantity must be at least 1.".to_string() };
        }

        match self.cart.add(&user_id, product_id, quantity).await {
            Ok(line) => {
                self.mirror.lock().await.record_add(product_id, quantity);
                info!(
                    event_name = "cart.add.applied",
                    user_id = %user_id,
                    product_id = %product_id,
                    quantity = line.quantity,
                    "cart line added"
                );
                MutationOutcome::Applied { message: format!("Added product {product_id} to cart!") }
            }
            Err(error) => {
                self.cart_failure("cart.add.failed", &user_id, product_id, error, "Failed to add to cart.")
                    .await
            }
        }
    }

    /// Sets the line quantity; zero or below removes the line, and a line
    /// that is already gone counts as removed.
    pub async fn update_quantity(&self, product_id: ProductId, quantity: i64) -> MutationOutcome {
        let Some(user_id) = self.session.user_id() else {
            return MutationOutcome::LoginRequired;
        };
        if quantity <= 0 {
            return self.remove_line(&user_id, product_id, true).await;
        }
        let Ok(quantity) = u32::try_from(quantity) else {
            return MutationOutcome::Invalid { message: format!("Quantity {quantity} is too large.") };
        };

        match self.cart.update_quantity(&user_id, product_id, quantity).await {
            Ok(_) => {
                self.mirror.lock().await.record_quantity(product_id, quantity);
                info!(
                    event_name = "cart.quantity.applied",
                    user_id = %user_id,
                    product_id = %product_id,
                    quantity,
                    "cart quantity updated"
                );
                MutationOutcome::Applied { message: "Cart updated.".to_string() }
            }
            Err(error) => {
                self.cart_failure(
                    "cart.quantity.failed",
                    &user_id,
                    product_id,
                    error,
                    "Failed to update cart.",
                )
                .await
            }
        }
    }

    pub async fn remove_from_cart(&self, product_id: ProductId) -> MutationOutcome {
        let Some(user_id) = self.session.user_id() else {
            return MutationOutcome::LoginRequired;
        };
        self.remove_line(&user_id, product_id, false).await
    }

    pub async fn clear_cart(&self) -> MutationOutcome {
        let Some(user_id) = self.session.user_id() else {
            return MutationOutcome::LoginRequired;
        };
        match self.cart.clear(&user_id).await {
            Ok(removed) => {
                self.mirror.lock().await.record_clear();
                info!(event_name = "cart.clear.applied", user_id = %user_id, removed, "cart cleared");
                MutationOutcome::Applied { message: "Cart cleared.".to_string() }
            }
            Err(error) => {
                self.mirror.lock().await.invalidate();
                warn!(event_name = "cart.clear.failed", user_id = %user_id, error = %error, "cart clear failed");
                MutationOutcome::Failed { message: "Failed to clear cart.".to_string() }
            }
        }
    }

    pub async fn add_to_wishlist(&self, product_id: ProductId) -> MutationOutcome {
        let Some(user_id) = self.session.user_id() else {
            return MutationOutcome::LoginRequired;
        };
        match self.wishlist.add(&user_id, product_id).await {
            Ok(_) => {
                info!(
                    event_name = "wishlist.add.applied",
                    user_id = %user_id,
                    product_id = %product_id,
                    "wishlist line added"
                );
                MutationOutcome::Applied {
                    message: format!("Added product {product_id} to wishlist!"),
                }
            }
            Err(error) => {
                wishlist_failure("wishlist.add.failed", &user_id, product_id, error, "Failed to add to wishlist.")
            }
        }
    }

    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> MutationOutcome {
        let Some(user_id) = self.session.user_id() else {
            return MutationOutcome::LoginRequired;
        };
        match self.wishlist.remove(&user_id, product_id).await {
            Ok(()) => {
                info!(
                    event_name = "wishlist.remove.applied",
                    user_id = %user_id,
                    product_id = %product_id,
                    "wishlist line removed"
                );
                MutationOutcome::Applied { message: "Removed from wishlist.".to_string() }
            }
            Err(error) => wishlist_failure(
                "wishlist.remove.failed",
                &user_id,
                product_id,
                error,
                "Failed to remove from wishlist.",
            ),
        }
    }

    /// Adds one unit to the cart, then drops the wishlist line. The wishlist
    /// line survives when the cart add does not succeed.
    pub async fn move_to_cart(&self, product_id: ProductId) -> MutationOutcome {
        let added = self.add_to_cart(product_id, 1).await;
        if !added.is_applied() {
            return added;
        }
        match self.remove_from_wishlist(product_id).await {
            MutationOutcome::Applied { .. } => {
                MutationOutcome::Applied { message: format!("Moved product {product_id} to cart!") }
            }
            _ => MutationOutcome::Notice {
                message: "Added to cart, but it is still on your wishlist.".to_string(),
            },
        }
    }

    pub async fn cart_lines(&self) -> Result<Vec<CartLine>, MutationOutcome> {
        let Some(user_id) = self.session.user_id() else {
            return Err(MutationOutcome::LoginRequired);
        };
        match self.cart.list(&user_id).await {
            Ok(lines) => {
                self.mirror.lock().await.replace(&lines, Utc::now());
                Ok(lines)
            }
            Err(error) => {
                warn!(event_name = "cart.list.failed", user_id = %user_id, error = %error, "cart load failed");
                Err(MutationOutcome::Failed { message: "Failed to load cart.".to_string() })
            }
        }
    }

    pub async fn wishlist_lines(&self) -> Result<Vec<WishlistLine>, MutationOutcome> {
        let Some(user_id) = self.session.user_id() else {
            return Err(MutationOutcome::LoginRequired);
        };
        self.wishlist.list(&user_id).await.map_err(|error| {
            warn!(
                event_name = "wishlist.list.failed",
                user_id = %user_id,
                error = %error,
                "wishlist load failed"
            );
            MutationOutcome::Failed { message: "Failed to load wishlist.".to_string() }
        })
    }

    /// Badge count from the mirror, reconciling with the store when stale.
    /// `None` when logged out or the store cannot be reached.
    pub async fn badge_count(&self) -> Option<u32> {
        let now = Utc::now();
        if let Some(count) = self.mirror.lock().await.badge_count(now) {
            return Some(count);
        }
        let lines = self.cart_lines().await.ok()?;
        Some(lines.iter().map(|line| line.quantity).fold(0u32, u32::saturating_add))
    }

    async fn remove_line(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        absent_is_removed: bool,
    ) -> MutationOutcome {
        let removed = match self.cart.remove(user_id, product_id).await {
            Err(StoreError::NotFound { entity: "cart item" }) if absent_is_removed => Ok(()),
            other => other,
        };
        match removed {
            Ok(()) => {
                self.mirror.lock().await.record_remove(product_id);
                info!(
                    event_name = "cart.remove.applied",
                    user_id = %user_id,
                    product_id = %product_id,
                    "cart line removed"
                );
                MutationOutcome::Applied { message: "Removed from cart.".to_string() }
            }
            Err(error) => {
                self.cart_failure(
                    "cart.remove.failed",
                    user_id,
                    product_id,
                    error,
                    "Failed to remove from cart.",
                )
                .await
            }
        }
    }

    async fn cart_failure(
        &self,
        event_name: &'static str,
        user_id: &UserId,
        product_id: ProductId,
        error: StoreError,
        banner: &str,
    ) -> MutationOutcome {
        self.mirror.lock().await.invalidate();
        warn!(
            event_name,
            user_id = %user_id,
            product_id = %product_id,
            error = %error,
            "cart mutation failed"
        );
        MutationOutcome::Failed { message: banner.to_string() }
    }
}

fn wishlist_failure(
    event_name: &'static str,
    user_id: &UserId,
    product_id: ProductId,
    error: StoreError,
    banner: &str,
) -> MutationOutcome {
    if error == StoreError::AlreadyInWishlist {
        info!(
            event_name,
            user_id = %user_id,
            product_id = %product_id,
            "product already in wishlist"
        );
        return MutationOutcome::Notice { message: ALREADY_IN_WISHLIST_NOTICE.to_string() };
    }
    warn!(
        event_name,
        user_id = %user_id,
        product_id = %product_id,
        error = %error,
        "wishlist mutation failed"
    );
    MutationOutcome::Failed { message: banner.to_string() }
}
