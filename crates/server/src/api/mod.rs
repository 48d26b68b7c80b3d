//! Storefront JSON API.
//!
//! Endpoints:
//! - `GET    /api/products`                 dataset rows with their original labels
//! - `GET    /api/products/{id}`            one dataset row
//! - `POST   /api/cart`                     add to cart (merges quantity)
//! - `PUT    /api/cart`                     set quantity; `<= 0` removes the line
//! - `DELETE /api/cart`                     remove a cart line
//! - `GET    /api/users/{userId}/cart`      cart lines with product details
//! - `GET    /api/users/{userId}/cart/summary?shipping=`  checkout totals
//! - `DELETE /api/users/cart/clear`         empty a cart
//! - `POST   /api/wishlist`                 add to wishlist
//! - `DELETE /api/wishlist`                 remove from wishlist
//! - `GET    /api/users/{userId}/wishlist`  wishlist lines with product details
//! - `POST   /api/users`                    register a shopper
//! - `PUT    /api/users/{userId}/city`      change the shopper's city
//! - `GET    /api/catalog`                  generated, filtered and sorted catalog
//! - `GET    /api/recommendations`          weather-driven picks
//!
//! Errors are answered as `{"message": "..."}`. Rejected forms add an
//! `errors` list of `{field, message}`.

mod cart;
mod catalog;
mod products;
mod users;
mod wishlist;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use wardrobe_core::cart::StoreError;
use wardrobe_core::catalog::{CatalogError, CatalogGenerator};
use wardrobe_core::config::AppConfig;
use wardrobe_core::domain::money::CurrencyPolicy;
use wardrobe_core::errors::DomainError;
use wardrobe_core::filter::PriceBands;
use wardrobe_core::recommend::{RecommendationService, WeatherProvider};
use wardrobe_core::session::SessionContext;
use wardrobe_core::validation::ValidationErrors;
use wardrobe_core::wire::MessageBody;
use wardrobe_db::repositories::{
    RepositoryError, SqlCartRepository, SqlProductRepository, SqlUserRepository,
    SqlWishlistRepository,
};
use wardrobe_db::DbPool;

pub type SharedWeather = Arc<dyn WeatherProvider>;
type Products = Arc<SqlProductRepository>;

#[derive(Clone)]
pub struct ApiState {
    users: Arc<SqlUserRepository>,
    products: Products,
    cart: Arc<SqlCartRepository>,
    wishlist: Arc<SqlWishlistRepository>,
    catalog: Arc<CatalogGenerator<Products>>,
    recommendations: Arc<RecommendationService<SharedWeather, Products>>,
    price_bands: PriceBands,
    currency: CurrencyPolicy,
    page_size: usize,
    default_city: String,
}

impl ApiState {
    pub fn new(db_pool: DbPool, config: &AppConfig, weather: SharedWeather) -> Self {
        let products = Arc::new(SqlProductRepository::new(db_pool.clone()));
        let catalog = Arc::new(CatalogGenerator::new(products.clone()));
        // The API has no shopper session of its own; recommendations are
        // always asked for by city or observation.
        let recommendations = Arc::new(RecommendationService::new(
            weather,
            catalog.clone(),
            Arc::new(SessionContext::new()),
        ));

        Self {
            users: Arc::new(SqlUserRepository::new(db_pool.clone())),
            products,
            cart: Arc::new(SqlCartRepository::new(db_pool.clone())),
            wishlist: Arc::new(SqlWishlistRepository::new(db_pool)),
            catalog,
            recommendations,
            price_bands: config.catalog.price_bands,
            currency: config.currency.clone(),
            page_size: config.catalog.page_size,
            default_city: config.weather.default_city.clone(),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/products", get(products::list_products))
        .route("/api/products/{id}", get(products::get_product))
        .route(
            "/api/cart",
            post(cart::add_to_cart).put(cart::update_cart_quantity).delete(cart::remove_from_cart),
        )
        .route("/api/users/cart/clear", delete(cart::clear_cart))
        .route("/api/users/{user_id}/cart", get(cart::user_cart))
        .route("/api/users/{user_id}/cart/summary", get(cart::cart_summary))
        .route("/api/users", post(users::register))
        .route("/api/wishlist", post(wishlist::add_to_wishlist).delete(wishlist::remove_from_wishlist))
        .route("/api/users/{user_id}/wishlist", get(wishlist::user_wishlist))
        .route("/api/users/{user_id}/city", put(users::update_city))
        .route("/api/catalog", get(catalog::catalog))
        .route("/api/recommendations", get(catalog::recommendations))
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InvalidForm(ValidationErrors),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidForm(errors) => {
                let message = errors.errors.first().map(|error| error.message).unwrap_or_default();
                let body = json!({"message": message, "errors": errors.errors});
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Unavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            Self::Internal(detail) => {
                let correlation_id = Uuid::new_v4().simple().to_string();
                error!(
                    event_name = "api.request.failed",
                    correlation_id = %correlation_id,
                    error = %detail,
                    "request failed with an internal error"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error".to_string())
            }
        };
        (status, Json(MessageBody::new(message))).into_response()
    }
}

fn not_found_message(entity: &str) -> String {
    match entity {
        "user" => "User not found".to_string(),
        "product" => "Product not found".to_string(),
        "cart item" => "Item not found in cart".to_string(),
        "wishlist item" => "Item not found in wishlist".to_string(),
        other => format!("{other} not found"),
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::AlreadyInWishlist => Self::bad_request("Product already in wishlist"),
            StoreError::NotFound { entity } => Self::NotFound(not_found_message(entity)),
            StoreError::Invalid(message) => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound(_) => Self::not_found("Product not found"),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::InvalidForm(errors)
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use wardrobe_core::config::AppConfig;
    use wardrobe_core::domain::weather::WeatherObservation;
    use wardrobe_core::recommend::{WeatherError, WeatherProvider};
    use wardrobe_db::{connect_with_settings, migrations, StorefrontSeed};

    use super::{router, ApiState};

    /// Rains in Bergen; every other city is unknown.
    pub struct BergenWeather;

    #[async_trait]
    impl WeatherProvider for BergenWeather {
        async fn current(&self, city: &str) -> Result<WeatherObservation, WeatherError> {
            match city {
                "Bergen" => Ok(WeatherObservation::new(12.0, "light rain", 4.0)),
                other => Err(WeatherError::UnknownCity(other.to_string())),
            }
        }
    }

    pub async fn seeded_app() -> Router {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        StorefrontSeed::load(&pool).await.expect("seed");
        router(ApiState::new(pool, &AppConfig::default(), Arc::new(BergenWeather)))
    }

    pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }
}
