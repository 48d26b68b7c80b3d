use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info};

use wardrobe_core::cart::{CartStore, StoreError};
use wardrobe_core::checkout::{OrderLine, OrderSummary, ShippingMethod};
use wardrobe_core::domain::cart::UserId;
use wardrobe_core::wire::{
    CartItemResponse, CartLineDetails, CheckoutSummary, ClearCartRequest, ClearCartResponse,
    LineRequest, MessageBody, ProductDetails,
};
use wardrobe_db::repositories::ProductRepository;

use super::{ApiError, ApiState};

const IDS_REQUIRED: &str = "User ID and Product ID are required";

pub async fn add_to_cart(
    State(state): State<ApiState>,
    Json(request): Json<LineRequest>,
) -> Result<Json<CartItemResponse>, ApiError> {
    let (Some(user_id), Some(product_id)) = (request.user_id, request.product_id) else {
        return Err(ApiError::bad_request(IDS_REQUIRED));
    };
    let quantity = request.quantity.unwrap_or(1);
    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|quantity| *quantity >= 1)
        .ok_or_else(|| ApiError::bad_request("Quantity must be at least 1"))?;

    let line = state.cart.add(&user_id, product_id, quantity).await?;
    info!(
        event_name = "api.cart.added",
        user_id = %user_id,
        product_id = %product_id,
        quantity = line.quantity,
        "cart line added"
    );
    Ok(Json(CartItemResponse { message: "Product added to cart".to_string(), cart_item: line }))
}

/// Sets the quantity of an existing line. Zero or less removes the line and
/// answers with a message only.
pub async fn update_cart_quantity(
    State(state): State<ApiState>,
    Json(request): Json<LineRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (Some(user_id), Some(product_id), Some(quantity)) =
        (request.user_id, request.product_id, request.quantity)
    else {
        return Err(ApiError::bad_request("User ID, Product ID, and quantity are required"));
    };

    if quantity <= 0 {
        match state.cart.remove(&user_id, product_id).await {
            Ok(()) | Err(StoreError::NotFound { entity: "cart item" }) => {}
            Err(error) => return Err(error.into()),
        }
        return to_json(MessageBody::new("Item removed from cart"));
    }

    let quantity = u32::try_from(quantity)
        .map_err(|_| ApiError::bad_request(format!("Quantity {quantity} is too large")))?;
    let line = state.cart.update_quantity(&user_id, product_id, quantity).await?;
    to_json(CartItemResponse { message: "Cart updated".to_string(), cart_item: line })
}

pub async fn remove_from_cart(
    State(state): State<ApiState>,
    Json(request): Json<LineRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    let (Some(user_id), Some(product_id)) = (request.user_id, request.product_id) else {
        return Err(ApiError::bad_request(IDS_REQUIRED));
    };
    state.cart.remove(&user_id, product_id).await?;
    Ok(Json(MessageBody::new("Product removed from cart")))
}

pub async fn user_cart(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CartLineDetails>>, ApiError> {
    let lines = state.cart.list(&UserId(user_id)).await?;

    let mut detailed = Vec::with_capacity(lines.len());
    for line in lines {
        let row = state.products.find_row(line.product_id).await?;
        detailed.push(CartLineDetails { line, product_details: ProductDetails::from_row(row) });
    }
    Ok(Json(detailed))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub shipping: Option<String>,
}

/// Prices every cart line from the catalog and totals the order for the
/// chosen shipping method (standard when absent).
pub async fn cart_summary(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<CheckoutSummary>, ApiError> {
    let shipping_method = match query.shipping.as_deref().map(str::trim) {
        None | Some("") => ShippingMethod::default(),
        Some(value) => value.parse::<ShippingMethod>()?,
    };

    let user_id = UserId(user_id);
    let cart_lines = state.cart.list(&user_id).await?;
    let mut lines = Vec::with_capacity(cart_lines.len());
    for line in cart_lines {
        let product = state.catalog.product(line.product_id).await?;
        lines.push(OrderLine::for_product(&product, line.quantity));
    }

    let summary = OrderSummary::compute(&lines, shipping_method);
    debug!(
        event_name = "api.cart.summarized",
        user_id = %user_id,
        shipping = shipping_method.as_str(),
        item_count = summary.item_count,
        "cart summarized"
    );
    Ok(Json(CheckoutSummary { lines, summary }))
}

pub async fn clear_cart(
    State(state): State<ApiState>,
    Json(request): Json<ClearCartRequest>,
) -> Result<Json<ClearCartResponse>, ApiError> {
    let Some(user_id) = request.user_id.filter(|user_id| !user_id.0.trim().is_empty()) else {
        return Err(ApiError::bad_request("User ID is required"));
    };

    let deleted_count = state.cart.clear(&user_id).await?;
    if deleted_count == 0 {
        return Err(ApiError::not_found("No cart items found for this user"));
    }
    info!(
        event_name = "api.cart.cleared",
        user_id = %user_id,
        deleted_count,
        "cart cleared"
    );
    Ok(Json(ClearCartResponse { message: "Cart cleared successfully".to_string(), deleted_count }))
}

fn to_json<T: serde::Serialize>(body: T) -> Result<Json<serde_json::Value>, ApiError> {
    serde_json::to_value(body).map(Json).map_err(|error| ApiError::Internal(error.to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::test_support::{call, seeded_app};

    #[tokio::test]
    async fn adding_twice_merges_into_one_line() {
        let app = seeded_app().await;
        let body = json!({"userId": "demo-user", "productId": "95", "quantity": 2});

        let (status, first) = call(&app, Method::POST, "/api/cart", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["message"], "Product added to cart");
        assert_eq!(first["cartItem"]["quantity"], 2);

        let (_, second) = call(&app, Method::POST, "/api/cart", Some(body)).await;
        assert_eq!(second["cartItem"]["quantity"], 4);

        let (status, cart) = call(&app, Method::GET, "/api/users/demo-user/cart", None).await;
        assert_eq!(status, StatusCode::OK);
        let lines = cart.as_array().expect("array");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["productDetails"]["Product Name"], "Thermal Waffle Tee");
    }

    #[tokio::test]
    async fn missing_ids_and_unknown_entities_are_rejected() {
        let app = seeded_app().await;

        let (status, body) = call(&app, Method::POST, "/api/cart", Some(json!({"userId": "demo-user"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User ID and Product ID are required");

        let (status, body) =
            call(&app, Method::POST, "/api/cart", Some(json!({"userId": "ghost", "productId": 95}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, body) =
            call(&app, Method::POST, "/api/cart", Some(json!({"userId": "demo-user", "productId": 5}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");
    }

    #[tokio::test]
    async fn non_positive_quantity_update_removes_the_line() {
        let app = seeded_app().await;
        call(&app, Method::POST, "/api/cart", Some(json!({"userId": "demo-user", "productId": 91}))).await;

        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/cart",
            Some(json!({"userId": "demo-user", "productId": 91, "quantity": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cartItem"]["quantity"], 3);

        let (status, body) = call(
            &app,
            Method::PUT,
            "/api/cart",
            Some(json!({"userId": "demo-user", "productId": 91, "quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Item removed from cart");

        let (_, cart) = call(&app, Method::GET, "/api/users/demo-user/cart", None).await;
        assert_eq!(cart, json!([]));
    }

    #[tokio::test]
    async fn removing_an_absent_line_is_not_found() {
        let app = seeded_app().await;
        let (status, body) = call(
            &app,
            Method::DELETE,
            "/api/cart",
            Some(json!({"userId": "demo-user", "productId": 92})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Item not found in cart");
    }

    #[tokio::test]
    async fn clearing_reports_deleted_count_then_not_found() {
        let app = seeded_app().await;
        for product in [91, 92, 93] {
            call(&app, Method::POST, "/api/cart", Some(json!({"userId": "demo-user", "productId": product})))
                .await;
        }
        let clear = json!({"userId": "demo-user"});

        let (status, body) = call(&app, Method::DELETE, "/api/users/cart/clear", Some(clear.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deletedCount"], 3);

        let (status, body) = call(&app, Method::DELETE, "/api/users/cart/clear", Some(clear)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No cart items found for this user");
    }

    #[tokio::test]
    async fn summary_prices_the_cart_for_the_chosen_shipping() {
        let app = seeded_app().await;
        let line = json!({"userId": "demo-user", "productId": 91, "quantity": 2});
        call(&app, Method::POST, "/api/cart", Some(line)).await;

        let (status, body) = call(&app, Method::GET, "/api/users/demo-user/cart/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lines"][0]["name"], "Classic Crew Tee");
        assert_eq!(body["lines"][0]["unitPrice"], "18.99");
        assert_eq!(body["summary"]["itemCount"], 2);
        assert_eq!(body["summary"]["subtotal"], "37.98");
        assert_eq!(body["summary"]["shippingMethod"], "standard");
        assert_eq!(body["summary"]["shipping"], "5.99");
        assert_eq!(body["summary"]["tax"], "2.66");
        assert_eq!(body["summary"]["total"], "46.63");

        let (_, body) =
            call(&app, Method::GET, "/api/users/demo-user/cart/summary?shipping=pickup", None).await;
        assert_eq!(body["summary"]["shipping"], "0.00");
        assert_eq!(body["summary"]["total"], "40.64");
    }

    #[tokio::test]
    async fn summary_rejects_unknown_shipping_and_users() {
        let app = seeded_app().await;

        let (status, _) =
            call(&app, Method::GET, "/api/users/demo-user/cart/summary?shipping=drone", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::GET, "/api/users/ghost/cart/summary", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }
}
