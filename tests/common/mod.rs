#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use marketplace_api::db::{self, DbConfig, DbPool};
use marketplace_api::entities::{
    cart_item, coupon,
    coupon::DiscountKind,
    product,
    shipping_rule::{self, ShippingKind},
};
use marketplace_api::events::{process_events, EventSender};
use marketplace_api::services::{
    CartService, CheckoutService, CouponService, OrderService, ProductService,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Fresh in-memory database with all migrations applied.
///
/// SQLite gives every pooled connection its own private in-memory database,
/// so the pool is capped at a single connection.
pub async fn test_db() -> Arc<DbPool> {
    let cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&cfg)
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    Arc::new(pool)
}

pub fn event_sender() -> Arc<EventSender> {
    let (tx, rx) = mpsc::channel(256);
    tokio::spawn(process_events(rx));
    Arc::new(EventSender::new(tx))
}

pub struct TestServices {
    pub db: Arc<DbPool>,
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub products: ProductService,
}

pub async fn test_services() -> TestServices {
    let db = test_db().await;
    let sender = event_sender();
    let coupons = CouponService::new(db.clone());
    TestServices {
        carts: CartService::new(db.clone(), sender.clone()),
        checkout: CheckoutService::new(db.clone(), coupons, sender.clone()),
        orders: OrderService::new(db.clone(), sender.clone()),
        products: ProductService::new(db.clone(), sender),
        db,
    }
}

pub async fn seed_product(db: &DbPool, sku: &str, price: Decimal, stock: i32) -> product::Model {
    let now = Utc::now();
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(sku.to_string()),
        name: Set(format!("Product {}", sku)),
        description: Set(None),
        price: Set(price),
        offer_price: Set(None),
        offer_start: Set(None),
        offer_end: Set(None),
        stock_quantity: Set(stock),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed product")
}

pub async fn seed_offer_product(
    db: &DbPool,
    sku: &str,
    price: Decimal,
    offer_price: Decimal,
    offer_start: DateTime<Utc>,
    offer_end: DateTime<Utc>,
    stock: i32,
) -> product::Model {
    let now = Utc::now();
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(sku.to_string()),
        name: Set(format!("Product {}", sku)),
        description: Set(None),
        price: Set(price),
        offer_price: Set(Some(offer_price)),
        offer_start: Set(Some(offer_start)),
        offer_end: Set(Some(offer_end)),
        stock_quantity: Set(stock),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed offer product")
}

pub async fn seed_cart_line(
    db: &DbPool,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> cart_item::Model {
    let now = Utc::now();
    cart_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed cart line")
}

pub async fn seed_shipping_rule(
    db: &DbPool,
    kind: ShippingKind,
    flat_cost: Decimal,
    free_over: Option<Decimal>,
) -> shipping_rule::Model {
    let now = Utc::now();
    shipping_rule::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{:?} shipping", kind)),
        kind: Set(kind),
        flat_cost: Set(flat_cost),
        free_over: Set(free_over),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed shipping rule")
}

pub async fn seed_coupon(
    db: &DbPool,
    code: &str,
    kind: DiscountKind,
    magnitude: Decimal,
    remaining_quantity: i32,
    max_use: i32,
) -> coupon::Model {
    let now = Utc::now();
    coupon::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_string()),
        kind: Set(kind),
        magnitude: Set(magnitude),
        starts_at: Set(now - Duration::days(1)),
        ends_at: Set(now + Duration::days(1)),
        remaining_quantity: Set(remaining_quantity),
        max_use: Set(max_use),
        total_used: Set(0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed coupon")
}
