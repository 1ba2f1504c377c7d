/*!
 * Marketplace checkout and settlement API.
 *
 * Carts, a priced catalog with offer windows, shipping rules, discount
 * coupons, and an atomic checkout settlement engine, exposed over HTTP.
 */

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{CartService, CheckoutService, CouponService, OrderService, ProductService};

/// Service instances shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub coupons: CouponService,
    pub orders: OrderService,
    pub products: ProductService,
}

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: Arc<AppConfig>, event_sender: Arc<EventSender>) -> Self {
        let coupons = CouponService::new(db.clone());
        let services = AppServices {
            carts: CartService::new(db.clone(), event_sender.clone()),
            checkout: CheckoutService::new(db.clone(), coupons.clone(), event_sender.clone()),
            coupons,
            orders: OrderService::new(db.clone(), event_sender.clone()),
            products: ProductService::new(db.clone(), event_sender.clone()),
        };

        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Generic envelope for the operational endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// All v1 API routes, to be nested under `/api/v1`.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(app_status))
        .nest("/products", handlers::product_routes())
        .nest("/carts", handlers::cart_routes())
        .nest("/checkout", handlers::checkout_routes())
        .nest("/orders", handlers::order_routes())
}

/// Liveness probe.
pub async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub version: &'static str,
    pub environment: String,
    pub database: &'static str,
}

/// Readiness probe: reports version and pings the database.
pub async fn app_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatusReport>> {
    let database = match state.db.ping().await {
        Ok(()) => "up",
        Err(_) => "down",
    };

    Json(ApiResponse::success(StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        database,
    }))
}
