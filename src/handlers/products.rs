use crate::handlers::common::{
    map_service_error, no_content_response, success_response, validate_input, PaginatedResponse,
    PaginationMeta, PaginationParams,
};
use crate::{entities::product, errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for catalog endpoints
pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/replenish", post(replenish_stock))
}

/// List active products, paginated
async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (products, total) = state
        .services
        .products
        .list_active(params.page_index(), params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::<product::Model> {
        data: products,
        meta: PaginationMeta::new(&params, total),
    }))
}

/// Fetch one product by id
async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

#[derive(Debug, Deserialize, Validate)]
struct ReplenishRequest {
    #[validate(range(min = 1, max = 1_000_000))]
    quantity: i32,
}

/// Add stock to a product
async fn replenish_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplenishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    state
        .services
        .products
        .replenish_stock(id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
