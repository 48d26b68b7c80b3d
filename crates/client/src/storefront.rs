//! Storefront REST API client.
//!
//! Implements [`ProductSource`], [`CartStore`] and [`WishlistStore`] over
//! HTTP so the catalog generator and the cart mutator can run against a
//! remote `wardrobe-server`. Requests carry the session's bearer token when a
//! shopper is logged in.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use wardrobe_core::cart::{CartStore, StoreError, WishlistStore, ALREADY_IN_WISHLIST};
use wardrobe_core::catalog::dataset::records_from_rows;
use wardrobe_core::catalog::{CatalogError, DatasetRow, ProductRecord, ProductSource};
use wardrobe_core::checkout::{OrderSummary, ShippingMethod};
use wardrobe_core::config::ApiConfig;
use wardrobe_core::domain::cart::{CartLine, UserId, WishlistLine};
use wardrobe_core::domain::product::ProductId;
use wardrobe_core::session::SessionContext;
use wardrobe_core::validation::{RegistrationForm, ShippingAddress, ValidationErrors};
use wardrobe_core::wire::{
    CartItemResponse, CartLineDetails, CheckoutSummary, CityUpdate, ClearCartRequest,
    ClearCartResponse, LineRequest, MessageBody, RegisteredUser, RegistrationResponse,
    WishlistItemResponse, WishlistLineDetails,
};

use crate::ClientError;

/// Why a form submission did not go through.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug)]
pub struct StorefrontClient {
    http: Client,
    base_url: Url,
    session: Arc<SessionContext>,
}

impl StorefrontClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<SessionContext>,
    ) -> Result<Self, ClientError> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|error| ClientError::BaseUrl { url: raw.clone(), reason: error.to_string() })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl { url: raw, reason: "not a base url".to_string() });
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url, session })
    }

    pub fn from_config(
        config: &ApiConfig,
        session: Arc<SessionContext>,
    ) -> Result<Self, ClientError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs), session)
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self.http.request(method, self.endpoint(segments));
        match self.session.snapshot() {
            Some(session) => builder.header(reqwest::header::AUTHORIZATION, session.bearer()),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let response =
            builder.send().await.map_err(|error| StoreError::Transport(error.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = store_error(status, &body);
            debug!(
                event_name = "client.request.rejected",
                status = status.as_u16(),
                error = %error,
                "storefront API rejected request"
            );
            return Err(error);
        }

        response.json::<T>().await.map_err(|error| StoreError::Transport(error.to_string()))
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, segments).json(body)).await
    }

    /// The dataset rows exactly as the API serves them.
    pub async fn product_rows(&self) -> Result<Vec<DatasetRow>, CatalogError> {
        self.send(self.request(Method::GET, &["api", "products"])).await.map_err(catalog_error)
    }

    pub async fn product_row(&self, product_id: ProductId) -> Result<DatasetRow, CatalogError> {
        let id = product_id.to_string();
        match self.send(self.request(Method::GET, &["api", "products", &id])).await {
            Err(StoreError::NotFound { .. }) => Err(CatalogError::NotFound(product_id)),
            other => other.map_err(catalog_error),
        }
    }

    pub async fn cart_details(&self, user_id: &UserId) -> Result<Vec<CartLineDetails>, StoreError> {
        self.send(self.request(Method::GET, &["api", "users", &user_id.0, "cart"])).await
    }

    pub async fn wishlist_details(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<WishlistLineDetails>, StoreError> {
        self.send(self.request(Method::GET, &["api", "users", &user_id.0, "wishlist"])).await
    }

    pub async fn update_city(&self, user_id: &UserId, city: &str) -> Result<(), StoreError> {
        let body = CityUpdate { city: city.to_string() };
        let _: MessageBody =
            self.send_json(Method::PUT, &["api", "users", &user_id.0, "city"], &body).await?;
        Ok(())
    }

    /// Validates the form locally and only then creates the account.
    pub async fn register(&self, form: &RegistrationForm) -> Result<RegisteredUser, SubmitError> {
        form.validate()?;
        let response: RegistrationResponse =
            self.send_json(Method::POST, &["api", "users"], form).await?;
        Ok(response.user)
    }

    pub async fn order_summary(
        &self,
        user_id: &UserId,
        shipping: ShippingMethod,
    ) -> Result<CheckoutSummary, StoreError> {
        let builder = self
            .request(Method::GET, &["api", "users", &user_id.0, "cart", "summary"])
            .query(&[("shipping", shipping.as_str())]);
        self.send(builder).await
    }

    /// Checks the shipping address, totals the cart and empties it. An empty
    /// cart is refused before anything is cleared.
    pub async fn place_order(
        &self,
        user_id: &UserId,
        address: &ShippingAddress,
        shipping: ShippingMethod,
    ) -> Result<OrderSummary, SubmitError> {
        address.validate()?;
        let checkout = self.order_summary(user_id, shipping).await?;
        if checkout.lines.is_empty() {
            return Err(StoreError::Invalid("Your cart is empty".to_string()).into());
        }
        CartStore::clear(self, user_id).await?;
        info!(
            event_name = "client.order.placed",
            user_id = %user_id,
            shipping = shipping.as_str(),
            total = %checkout.summary.total.to_decimal(),
            "order placed"
        );
        Ok(checkout.summary)
    }
}

/// Maps a non-2xx response to the store taxonomy. The API answers with
/// `{"message": "..."}`; anything else is passed through as text.
fn store_error(status: StatusCode, body: &str) -> StoreError {
    let message = serde_json::from_str::<MessageBody>(body)
        .map(|body| body.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::BAD_REQUEST if message.to_lowercase().contains(ALREADY_IN_WISHLIST) => {
            StoreError::AlreadyInWishlist
        }
        StatusCode::BAD_REQUEST => StoreError::Invalid(message),
        StatusCode::NOT_FOUND => StoreError::NotFound { entity: missing_entity(&message) },
        _ => StoreError::Rejected { status: status.as_u16(), message },
    }
}

fn missing_entity(message: &str) -> &'static str {
    let message = message.to_lowercase();
    if message.starts_with("user") {
        "user"
    } else if message.starts_with("product") {
        "product"
    } else if message.contains("in cart") || message.contains("cart items") {
        "cart item"
    } else if message.contains("in wishlist") {
        "wishlist item"
    } else {
        "resource"
    }
}

fn catalog_error(error: StoreError) -> CatalogError {
    match error {
        StoreError::Transport(message) => CatalogError::SourceUnavailable(message),
        other => CatalogError::SourceUnavailable(other.to_string()),
    }
}

#[async_trait]
impl ProductSource for StorefrontClient {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        let rows = self.product_rows().await?;
        Ok(records_from_rows(rows))
    }
}

#[async_trait]
impl CartStore for StorefrontClient {
    async fn add(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, StoreError> {
        let body = LineRequest::new(user_id, product_id).with_quantity(i64::from(quantity));
        let response: CartItemResponse =
            self.send_json(Method::POST, &["api", "cart"], &body).await?;
        Ok(response.cart_item)
    }

    async fn update_quantity(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, StoreError> {
        if quantity == 0 {
            return Err(StoreError::Invalid("quantity must be at least 1".to_string()));
        }
        let body = LineRequest::new(user_id, product_id).with_quantity(i64::from(quantity));
        let response: CartItemResponse =
            self.send_json(Method::PUT, &["api", "cart"], &body).await?;
        Ok(response.cart_item)
    }

    async fn remove(&self, user_id: &UserId, product_id: ProductId) -> Result<(), StoreError> {
        let body = LineRequest::new(user_id, product_id);
        let _: MessageBody = self.send_json(Method::DELETE, &["api", "cart"], &body).await?;
        Ok(())
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError> {
        let lines = self.cart_details(user_id).await?;
        Ok(lines.into_iter().map(|details| details.line).collect())
    }

    async fn clear(&self, user_id: &UserId) -> Result<u64, StoreError> {
        let body = ClearCartRequest { user_id: Some(user_id.clone()) };
        let response: Result<ClearCartResponse, _> =
            self.send_json(Method::DELETE, &["api", "users", "cart", "clear"], &body).await;
        match response {
            Ok(cleared) => Ok(cleared.deleted_count),
            // The API answers an already-empty cart with 404.
            Err(StoreError::NotFound { entity: "cart item" }) => Ok(0),
            Err(error) => {
                warn!(
                    event_name = "client.cart.clear_failed",
                    user_id = %user_id,
                    error = %error,
                    "clearing remote cart failed"
                );
                Err(error)
            }
        }
    }
}

#[async_trait]
impl WishlistStore for StorefrontClient {
    async fn add(
        &self,
        user_id: &UserId,
        product_id: ProductId,
    ) -> Result<WishlistLine, StoreError> {
        let body = LineRequest::new(user_id, product_id);
        let response: WishlistItemResponse =
            self.send_json(Method::POST, &["api", "wishlist"], &body).await?;
        Ok(response.wishlist_item)
    }

    async fn remove(&self, user_id: &UserId, product_id: ProductId) -> Result<(), StoreError> {
        let body = LineRequest::new(user_id, product_id);
        let _: MessageBody = self.send_json(Method::DELETE, &["api", "wishlist"], &body).await?;
        Ok(())
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<WishlistLine>, StoreError> {
        let lines = self.wishlist_details(user_id).await?;
        Ok(lines.into_iter().map(|details| details.line).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::{json, Value};

    use super::{store_error, StorefrontClient, SubmitError};
    use wardrobe_core::cart::{CartStore, StoreError, WishlistStore};
    use wardrobe_core::checkout::ShippingMethod;
    use wardrobe_core::catalog::ProductSource;
    use wardrobe_core::domain::cart::UserId;
    use wardrobe_core::domain::product::ProductId;
    use wardrobe_core::session::{Session, SessionContext};
    use wardrobe_core::validation::{RegistrationForm, ShippingAddress};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });
        format!("http://{address}")
    }

    fn client(base_url: &str, session: Arc<SessionContext>) -> StorefrontClient {
        StorefrontClient::new(base_url, Duration::from_secs(5), session).expect("client")
    }

    fn logged_in() -> Arc<SessionContext> {
        let context = Arc::new(SessionContext::new());
        context.login(Session::new(
            UserId("u-1".to_string()),
            "Asha",
            SecretString::from("t-1".to_string()),
        ));
        context
    }

    fn user() -> UserId {
        UserId("u-1".to_string())
    }

    #[test]
    fn error_bodies_map_to_store_errors() {
        let duplicate = store_error(StatusCode::BAD_REQUEST, r#"{"message":"Product already in wishlist"}"#);
        assert_eq!(duplicate, StoreError::AlreadyInWishlist);

        let missing_user = store_error(StatusCode::NOT_FOUND, r#"{"message":"User not found"}"#);
        assert_eq!(missing_user, StoreError::NotFound { entity: "user" });

        let missing_line = store_error(StatusCode::NOT_FOUND, r#"{"message":"Item not found in cart"}"#);
        assert_eq!(missing_line, StoreError::NotFound { entity: "cart item" });

        let crash = store_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(crash, StoreError::Rejected { status: 500, message: "boom".to_string() });
    }

    #[tokio::test]
    async fn duplicate_wishlist_add_is_a_business_rule() {
        let base = serve(Router::new().route(
            "/api/wishlist",
            post(|| async {
                (StatusCode::BAD_REQUEST, Json(json!({"message": "Product already in wishlist"})))
            }),
        ))
        .await;

        let error = WishlistStore::add(&client(&base, logged_in()), &user(), ProductId(95))
            .await
            .expect_err("duplicate");

        assert_eq!(error, StoreError::AlreadyInWishlist);
        assert!(error.is_business_rule());
    }

    #[tokio::test]
    async fn cart_listing_sends_bearer_and_drops_details() {
        async fn cart(headers: HeaderMap) -> (StatusCode, Json<Value>) {
            if headers.get("authorization").and_then(|value| value.to_str().ok())
                != Some("Bearer t-1")
            {
                return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Not authorized"})));
            }
            (
                StatusCode::OK,
                Json(json!([
                    {
                        "userId": "u-1",
                        "productId": 95,
                        "quantity": 2,
                        "dateAdded": "2024-05-01T10:00:00Z",
                        "productDetails": {"Product ID": "95", "Product Name": "Thermal Waffle Tee"}
                    },
                    {
                        "userId": "u-1",
                        "productId": 960,
                        "quantity": 1,
                        "dateAdded": "2024-04-01T10:00:00Z",
                        "productDetails": {"message": "Product details not found"}
                    }
                ])),
            )
        }
        let base = serve(Router::new().route("/api/users/{user_id}/cart", get(cart))).await;

        let lines = CartStore::list(&client(&base, logged_in()), &user()).await.expect("list");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, ProductId(95));
        assert_eq!(lines[0].quantity, 2);

        let anonymous = client(&base, Arc::new(SessionContext::new()));
        let error = CartStore::list(&anonymous, &user()).await.expect_err("unauthorized");
        assert!(matches!(error, StoreError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn clearing_an_empty_cart_reports_zero() {
        let base = serve(Router::new().route(
            "/api/users/cart/clear",
            delete(|| async {
                (StatusCode::NOT_FOUND, Json(json!({"message": "No cart items found for this user"})))
            }),
        ))
        .await;

        let cleared = CartStore::clear(&client(&base, logged_in()), &user()).await.expect("clear");
        assert_eq!(cleared, 0);
    }

    #[tokio::test]
    async fn product_source_skips_rows_without_a_numeric_id() {
        let base = serve(Router::new().route(
            "/api/products",
            get(|| async {
                Json(json!([
                    {"Product ID": "95", "Product Name": "Thermal Waffle Tee", "Price": "38.00"},
                    {"Product ID": "abc", "Product Name": "Broken Row"}
                ]))
            }),
        ))
        .await;

        let records = client(&base, logged_in()).fetch_all().await.expect("fetch");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_id, ProductId(95));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("addr");
        drop(listener);

        let error = CartStore::add(
            &client(&format!("http://{address}"), logged_in()),
            &user(),
            ProductId(95),
            1,
        )
        .await
        .expect_err("closed port");
        assert!(matches!(error, StoreError::Transport(_)));
    }

    #[test]
    fn endpoints_keep_the_base_path_and_encode_each_segment() {
        let scoped = client("http://shop.test/storefront/", Arc::new(SessionContext::new()));
        assert_eq!(
            scoped.endpoint(&["api", "users", "a/b?c#d", "cart"]).as_str(),
            "http://shop.test/storefront/api/users/a%2Fb%3Fc%23d/cart"
        );

        let error = StorefrontClient::new("mailto:shop@test", Duration::from_secs(5), logged_in())
            .expect_err("not a base");
        assert!(matches!(error, crate::ClientError::BaseUrl { .. }));
    }

    #[tokio::test]
    async fn user_ids_with_reserved_characters_reach_the_server_intact() {
        async fn wishlist(Path(user_id): Path<String>) -> (StatusCode, Json<Value>) {
            if user_id == "a/b?c#d" {
                (StatusCode::OK, Json(json!([])))
            } else {
                (StatusCode::BAD_REQUEST, Json(json!({"message": format!("unexpected id {user_id}")})))
            }
        }
        let base = serve(Router::new().route("/api/users/{user_id}/wishlist", get(wishlist))).await;

        let lines = WishlistStore::list(&client(&base, logged_in()), &UserId("a/b?c#d".to_string()))
            .await
            .expect("single path segment");
        assert!(lines.is_empty());
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            address: "1 Main St".to_string(),
            city: "Pune".to_string(),
            zip_code: "411001".to_string(),
        }
    }

    fn closed_port_client() -> StorefrontClient {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let address = listener.local_addr().expect("addr");
        drop(listener);
        client(&format!("http://{address}"), logged_in())
    }

    #[tokio::test]
    async fn invalid_forms_are_rejected_before_sending() {
        let client = closed_port_client();
        let form = RegistrationForm {
            username: "asha".to_string(),
            email: "asha.example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        };

        match client.register(&form).await {
            Err(SubmitError::Invalid(errors)) => {
                assert_eq!(errors.message_for("email"), Some("Please enter a valid email address"));
            }
            other => panic!("expected local rejection, got {other:?}"),
        }

        let blank_zip = ShippingAddress { zip_code: " ".to_string(), ..address() };
        match client.place_order(&user(), &blank_zip, ShippingMethod::Standard).await {
            Err(SubmitError::Invalid(errors)) => {
                assert_eq!(errors.message_for("zipCode"), Some("ZIP code is required"));
            }
            other => panic!("expected local rejection, got {other:?}"),
        }
    }

    fn checkout_body(shipping: &str, lines: Value) -> Value {
        json!({
            "lines": lines,
            "summary": {
                "itemCount": 2,
                "subtotal": "37.98",
                "shippingMethod": shipping,
                "shipping": "12.99",
                "tax": "2.66",
                "total": "53.63"
            }
        })
    }

    #[tokio::test]
    async fn placing_an_order_totals_then_clears_the_cart() {
        async fn summary(
            Path(user_id): Path<String>,
            Query(params): Query<HashMap<String, String>>,
        ) -> Json<Value> {
            assert_eq!(user_id, "u-1");
            let shipping = params.get("shipping").cloned().unwrap_or_default();
            Json(checkout_body(
                &shipping,
                json!([{"productId": 91, "name": "Classic Crew Tee", "unitPrice": "18.99", "quantity": 2}]),
            ))
        }
        let base = serve(
            Router::new()
                .route("/api/users/{user_id}/cart/summary", get(summary))
                .route(
                    "/api/users/cart/clear",
                    delete(|| async {
                        Json(json!({"message": "Cart cleared successfully", "deletedCount": 1}))
                    }),
                ),
        )
        .await;

        let placed = client(&base, logged_in())
            .place_order(&user(), &address(), ShippingMethod::Express)
            .await
            .expect("order");
        assert_eq!(placed.shipping_method, ShippingMethod::Express);
        assert_eq!(placed.item_count, 2);
        assert_eq!(placed.total.minor_units(), 5_363);
    }

    #[tokio::test]
    async fn an_empty_cart_is_not_cleared_or_ordered() {
        let base = serve(
            Router::new()
                .route(
                    "/api/users/{user_id}/cart/summary",
                    get(|| async { Json(checkout_body("standard", json!([]))) }),
                )
                .route(
                    "/api/users/cart/clear",
                    delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "cleared an empty cart") }),
                ),
        )
        .await;

        let error = client(&base, logged_in())
            .place_order(&user(), &address(), ShippingMethod::Standard)
            .await
            .expect_err("empty cart");
        assert!(matches!(error, SubmitError::Store(StoreError::Invalid(_))));
    }
}
