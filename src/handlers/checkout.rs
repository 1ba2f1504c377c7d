use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{
    errors::ApiError,
    services::checkout::{CouponPreview, SettleCheckoutInput, SettledOrder},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settle", post(settle_checkout))
        .route("/coupons/preview", post(preview_coupon))
}

/// Settle the caller's cart into an order
async fn settle_checkout(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SettleCheckoutInput>,
) -> Result<impl IntoResponse, ApiError> {
    let settled: SettledOrder = state
        .services
        .checkout
        .settle(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(settled))
}

#[derive(Debug, Deserialize)]
struct CouponPreviewRequest {
    code: String,
    subtotal: Decimal,
}

/// Report what a coupon code would deduct from a given subtotal
async fn preview_coupon(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CouponPreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let preview: CouponPreview = state
        .services
        .checkout
        .preview_coupon(&payload.code, payload.subtotal)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(preview))
}
