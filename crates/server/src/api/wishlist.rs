use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use wardrobe_core::cart::WishlistStore;
use wardrobe_core::domain::cart::UserId;
use wardrobe_core::wire::{
    LineRequest, MessageBody, ProductDetails, WishlistItemResponse, WishlistLineDetails,
};
use wardrobe_db::repositories::ProductRepository;

use super::{ApiError, ApiState};

pub async fn add_to_wishlist(
    State(state): State<ApiState>,
    Json(request): Json<LineRequest>,
) -> Result<Json<WishlistItemResponse>, ApiError> {
    let (Some(user_id), Some(product_id)) = (request.user_id, request.product_id) else {
        return Err(ApiError::bad_request("User ID and Product ID are required"));
    };

    let line = state.wishlist.add(&user_id, product_id).await?;
    info!(
        event_name = "api.wishlist.added",
        user_id = %user_id,
        product_id = %product_id,
        "wishlist line added"
    );
    Ok(Json(WishlistItemResponse {
        message: "Product added to wishlist".to_string(),
        wishlist_item: line,
    }))
}

pub async fn remove_from_wishlist(
    State(state): State<ApiState>,
    Json(request): Json<LineRequest>,
) -> Result<Json<MessageBody>, ApiError> {
    let (Some(user_id), Some(product_id)) = (request.user_id, request.product_id) else {
        return Err(ApiError::bad_request("User ID and Product ID are required"));
    };
    state.wishlist.remove(&user_id, product_id).await?;
    Ok(Json(MessageBody::new("Product removed from wishlist")))
}

pub async fn user_wishlist(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<WishlistLineDetails>>, ApiError> {
    let lines = state.wishlist.list(&UserId(user_id)).await?;

    let mut detailed = Vec::with_capacity(lines.len());
    for line in lines {
        let row = state.products.find_row(line.product_id).await?;
        detailed.push(WishlistLineDetails { line, product_details: ProductDetails::from_row(row) });
    }
    Ok(Json(detailed))
}
