use crate::handlers::common::{
    map_service_error, success_response, PaginatedResponse, PaginationMeta, PaginationParams,
};
use crate::{
    entities::order::{self, OrderStatus},
    errors::ApiError,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Creates the router for order endpoints
pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(get_order))
        .route("/:id/items", get(get_order_items))
        .route("/:id/status", put(update_status))
        .route("/:id/pay", post(mark_paid))
        .route("/invoice/:invoice_number", get(get_by_invoice))
        .route("/user/:user_id", get(list_for_user))
}

/// Fetch one order by id
async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Fetch the line items of an order
async fn get_order_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .orders
        .get_items(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(items))
}

/// Look an order up by its invoice number
async fn get_by_invoice(
    State(state): State<Arc<AppState>>,
    Path(invoice_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_by_invoice_number(&invoice_number)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// List a user's orders, newest first
async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (orders, total) = state
        .services
        .orders
        .list_for_user(user_id, params.page_index(), params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::<order::Model> {
        data: orders,
        meta: PaginationMeta::new(&params, total),
    }))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

/// Transition an order to a new status
async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_status(id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Mark an order as paid
async fn mark_paid(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .mark_paid(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}
