use axum::extract::{Path, State};
use axum::Json;

use wardrobe_core::catalog::DatasetRow;
use wardrobe_core::domain::product::ProductId;
use wardrobe_db::repositories::ProductRepository;

use super::{ApiError, ApiState};

pub async fn list_products(State(state): State<ApiState>) -> Result<Json<Vec<DatasetRow>>, ApiError> {
    let rows = state.products.list_rows().await?;
    if rows.is_empty() {
        return Err(ApiError::not_found("No products found"));
    }
    Ok(Json(rows))
}

pub async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<DatasetRow>, ApiError> {
    let product_id =
        id.parse::<ProductId>().map_err(|_| ApiError::not_found("Product not found"))?;
    state
        .products
        .find_row(product_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}
