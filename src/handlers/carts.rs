use crate::handlers::common::{
    map_service_error, no_content_response, success_response, validate_input,
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:user_id", get(get_cart))
        .route("/:user_id/items", post(add_item))
        .route("/:user_id/items/:product_id", put(set_quantity))
        .route("/:user_id/items/:product_id", delete(remove_item))
        .route("/:user_id", delete(clear_cart))
}

#[derive(Debug, Deserialize, Validate)]
struct AddItemRequest {
    product_id: Uuid,
    #[validate(range(min = 1, max = 10_000))]
    quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
struct SetQuantityRequest {
    #[validate(range(max = 10_000))]
    quantity: i32,
}

#[derive(Debug, Serialize)]
struct CartLineResponse {
    product_id: Uuid,
    quantity: i32,
    product_name: Option<String>,
}

/// List the cart contents for a user
async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = state
        .services
        .carts
        .list(user_id)
        .await
        .map_err(map_service_error)?;

    let body: Vec<CartLineResponse> = lines
        .into_iter()
        .map(|(line, prod)| CartLineResponse {
            product_id: line.product_id,
            quantity: line.quantity,
            product_name: prod.map(|p| p.name),
        })
        .collect();

    Ok(success_response(body))
}

/// Add a product to the cart, merging with an existing line
async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let line = state
        .services
        .carts
        .add_item(user_id, payload.product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(line))
}

/// Set the quantity of a cart line; zero removes it
async fn set_quantity(
    State(state): State<Arc<AppState>>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let line = state
        .services
        .carts
        .set_quantity(user_id, product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    match line {
        Some(line) => Ok(success_response(line)),
        None => Ok(no_content_response()),
    }
}

/// Remove a product from the cart
async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .carts
        .remove_item(user_id, product_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Empty the cart
async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .carts
        .clear(user_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
