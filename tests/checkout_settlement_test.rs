//! Integration tests for the checkout settlement engine: pricing snapshots,
//! shipping rules, coupon application, and transactional rollback.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use common::*;
use marketplace_api::entities::{
    cart_item::{self, Entity as CartItem},
    coupon::{DiscountKind, Entity as Coupon},
    order::Entity as Order,
    order_item::Entity as OrderItem,
    product::Entity as Product,
    shipping_rule::ShippingKind,
};
use marketplace_api::errors::ServiceError;
use marketplace_api::services::SettleCheckoutInput;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn settle_input(user_id: Uuid) -> SettleCheckoutInput {
    SettleCheckoutInput {
        user_id,
        address_id: Uuid::new_v4(),
        payment_method: "card".to_string(),
        shipping_rule_id: None,
        coupon_code: None,
    }
}

#[tokio::test]
async fn settles_cart_into_order_with_snapshots() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p1 = seed_product(&svc.db, "SKU-A", dec!(100), 10).await;
    let p2 = seed_product(&svc.db, "SKU-B", dec!(40), 10).await;
    seed_cart_line(&svc.db, user, p1.id, 2).await;
    seed_cart_line(&svc.db, user, p2.id, 3).await;

    let settled = svc.checkout.settle(settle_input(user)).await.expect("settle");

    assert_eq!(settled.order.subtotal, dec!(320));
    assert_eq!(settled.order.shipping_cost, Decimal::ZERO);
    assert_eq!(settled.order.discount_total, Decimal::ZERO);
    assert_eq!(settled.order.total_amount, dec!(320));
    assert_eq!(settled.order.item_count, 5);
    assert!(!settled.order.is_paid);
    assert!(settled.order.invoice_number.starts_with("INV-"));
    assert_eq!(settled.items.len(), 2);

    // Stock decremented and cart cleared
    let p1_after = Product::find_by_id(p1.id)
        .one(&*svc.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(p1_after.stock_quantity, 8);
    let remaining_lines = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user))
        .count(&*svc.db)
        .await
        .unwrap();
    assert_eq!(remaining_lines, 0);
}

#[tokio::test]
async fn offer_price_is_snapshotted_into_order_lines() {
    let svc = test_services().await;
    let user = Uuid::new_v4();
    let now = Utc::now();

    let p = seed_offer_product(
        &svc.db,
        "SKU-OFFER",
        dec!(100),
        dec!(75),
        now - Duration::hours(1),
        now + Duration::hours(1),
        10,
    )
    .await;
    seed_cart_line(&svc.db, user, p.id, 2).await;

    let settled = svc.checkout.settle(settle_input(user)).await.expect("settle");

    assert_eq!(settled.order.subtotal, dec!(150));
    let item = OrderItem::find()
        .filter(marketplace_api::entities::order_item::Column::OrderId.eq(settled.order.id))
        .one(&*svc.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.unit_price, dec!(75));
    assert_eq!(item.quantity, 2);
}

#[tokio::test]
async fn threshold_shipping_is_waived_above_minimum() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p = seed_product(&svc.db, "SKU-A", dec!(300), 10).await;
    seed_cart_line(&svc.db, user, p.id, 2).await;
    let rule = seed_shipping_rule(&svc.db, ShippingKind::ThresholdFree, dec!(150), Some(dec!(500)))
        .await;

    let mut input = settle_input(user);
    input.shipping_rule_id = Some(rule.id);
    let settled = svc.checkout.settle(input).await.expect("settle");

    assert_eq!(settled.order.subtotal, dec!(600));
    assert_eq!(settled.order.shipping_cost, Decimal::ZERO);
    assert_eq!(settled.order.total_amount, dec!(600));
}

#[tokio::test]
async fn threshold_shipping_is_charged_below_minimum() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p = seed_product(&svc.db, "SKU-A", dec!(100), 10).await;
    seed_cart_line(&svc.db, user, p.id, 2).await;
    let rule = seed_shipping_rule(&svc.db, ShippingKind::ThresholdFree, dec!(150), Some(dec!(500)))
        .await;

    let mut input = settle_input(user);
    input.shipping_rule_id = Some(rule.id);
    let settled = svc.checkout.settle(input).await.expect("settle");

    assert_eq!(settled.order.shipping_cost, dec!(150));
    assert_eq!(settled.order.total_amount, dec!(350));
}

#[tokio::test]
async fn unknown_shipping_rule_is_rejected() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p = seed_product(&svc.db, "SKU-A", dec!(100), 10).await;
    seed_cart_line(&svc.db, user, p.id, 1).await;

    let mut input = settle_input(user);
    input.shipping_rule_id = Some(Uuid::new_v4());
    let err = svc.checkout.settle(input).await.unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn percent_coupon_discounts_subtotal_not_shipping() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p = seed_product(&svc.db, "SKU-A", dec!(100), 10).await;
    seed_cart_line(&svc.db, user, p.id, 2).await;
    let rule = seed_shipping_rule(&svc.db, ShippingKind::Flat, dec!(10), None).await;
    let coupon = seed_coupon(&svc.db, "SAVE10", DiscountKind::Percent, dec!(10), 5, 0).await;

    let mut input = settle_input(user);
    input.shipping_rule_id = Some(rule.id);
    input.coupon_code = Some("SAVE10".to_string());
    let settled = svc.checkout.settle(input).await.expect("settle");

    // 10% of the 200 subtotal, shipping untouched
    assert_eq!(settled.order.discount_total, dec!(20));
    assert_eq!(settled.order.total_amount, dec!(190));
    assert_eq!(settled.order.coupon_code.as_deref(), Some("SAVE10"));

    let coupon_after = Coupon::find_by_id(coupon.id)
        .one(&*svc.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon_after.remaining_quantity, 4);
    assert_eq!(coupon_after.total_used, 1);
}

#[tokio::test]
async fn oversized_fixed_coupon_clamps_total_at_zero() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p = seed_product(&svc.db, "SKU-A", dec!(30), 10).await;
    seed_cart_line(&svc.db, user, p.id, 1).await;
    seed_coupon(&svc.db, "BIGONE", DiscountKind::Fixed, dec!(500), 5, 0).await;

    let mut input = settle_input(user);
    input.coupon_code = Some("BIGONE".to_string());
    let settled = svc.checkout.settle(input).await.expect("settle");

    assert_eq!(settled.order.discount_total, dec!(500));
    assert_eq!(settled.order.total_amount, Decimal::ZERO);
}

#[tokio::test]
async fn failing_coupon_degrades_to_no_discount() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p = seed_product(&svc.db, "SKU-A", dec!(100), 10).await;
    seed_cart_line(&svc.db, user, p.id, 1).await;
    // Exhausted coupon: settlement proceeds without it
    seed_coupon(&svc.db, "SPENT", DiscountKind::Fixed, dec!(10), 0, 0).await;

    let mut input = settle_input(user);
    input.coupon_code = Some("SPENT".to_string());
    let settled = svc.checkout.settle(input).await.expect("settle");

    assert_eq!(settled.order.discount_total, Decimal::ZERO);
    assert_eq!(settled.order.total_amount, dec!(100));
    assert_eq!(settled.order.coupon_code, None);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let svc = test_services().await;
    let err = svc.checkout.settle(settle_input(Uuid::new_v4())).await.unwrap_err();
    assert_matches!(err, ServiceError::EmptyCart);
}

#[tokio::test]
async fn double_submit_settles_once() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p = seed_product(&svc.db, "SKU-A", dec!(100), 10).await;
    seed_cart_line(&svc.db, user, p.id, 1).await;

    svc.checkout.settle(settle_input(user)).await.expect("first settle");
    let err = svc.checkout.settle(settle_input(user)).await.unwrap_err();

    assert_matches!(err, ServiceError::EmptyCart);
    let order_count = Order::find().count(&*svc.db).await.unwrap();
    assert_eq!(order_count, 1);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_everything() {
    let svc = test_services().await;
    let user = Uuid::new_v4();

    let plentiful = seed_product(&svc.db, "SKU-OK", dec!(50), 100).await;
    let scarce = seed_product(&svc.db, "SKU-LOW", dec!(80), 1).await;
    seed_cart_line(&svc.db, user, plentiful.id, 2).await;
    seed_cart_line(&svc.db, user, scarce.id, 3).await;
    let coupon = seed_coupon(&svc.db, "ROLLBACK", DiscountKind::Percent, dec!(10), 5, 0).await;

    let mut input = settle_input(user);
    input.coupon_code = Some("ROLLBACK".to_string());
    let err = svc.checkout.settle(input).await.unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // No order or order lines persisted
    assert_eq!(Order::find().count(&*svc.db).await.unwrap(), 0);
    assert_eq!(OrderItem::find().count(&*svc.db).await.unwrap(), 0);

    // The plentiful product's decrement was rolled back
    let plentiful_after = Product::find_by_id(plentiful.id)
        .one(&*svc.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plentiful_after.stock_quantity, 100);

    // Coupon counters restored even though redemption ran first
    let coupon_after = Coupon::find_by_id(coupon.id)
        .one(&*svc.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon_after.remaining_quantity, 5);
    assert_eq!(coupon_after.total_used, 0);

    // Cart left intact for the shopper to fix up
    let lines = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user))
        .count(&*svc.db)
        .await
        .unwrap();
    assert_eq!(lines, 2);
}

#[tokio::test]
async fn coupon_preview_reports_discount_and_rejections() {
    let svc = test_services().await;

    seed_coupon(&svc.db, "SAVE25", DiscountKind::Percent, dec!(25), 5, 0).await;
    let preview = svc
        .checkout
        .preview_coupon("SAVE25", dec!(200))
        .await
        .expect("preview");
    assert_eq!(preview.discount, dec!(50));

    seed_coupon(&svc.db, "SPENT", DiscountKind::Fixed, dec!(10), 0, 0).await;
    assert_matches!(
        svc.checkout.preview_coupon("SPENT", dec!(200)).await,
        Err(ServiceError::ExhaustedCoupon)
    );
    assert_matches!(
        svc.checkout.preview_coupon("NOPE", dec!(200)).await,
        Err(ServiceError::InvalidCoupon)
    );
}

#[tokio::test]
async fn order_lifecycle_transitions() {
    use marketplace_api::entities::order::OrderStatus;

    let svc = test_services().await;
    let user = Uuid::new_v4();

    let p = seed_product(&svc.db, "SKU-A", dec!(100), 10).await;
    seed_cart_line(&svc.db, user, p.id, 1).await;
    let settled = svc.checkout.settle(settle_input(user)).await.expect("settle");
    let order_id = settled.order.id;

    assert_eq!(settled.order.status, OrderStatus::Pending);

    // Cannot skip straight to Shipped
    assert_matches!(
        svc.orders.update_status(order_id, OrderStatus::Shipped).await,
        Err(ServiceError::InvalidOperation(_))
    );

    let order = svc
        .orders
        .update_status(order_id, OrderStatus::Processing)
        .await
        .expect("to processing");
    assert_eq!(order.status, OrderStatus::Processing);

    let paid = svc.orders.mark_paid(order_id).await.expect("mark paid");
    assert!(paid.is_paid);
    // Idempotent
    let paid_again = svc.orders.mark_paid(order_id).await.expect("mark paid again");
    assert!(paid_again.is_paid);

    let by_invoice = svc
        .orders
        .get_by_invoice_number(&settled.order.invoice_number)
        .await
        .expect("lookup by invoice");
    assert_eq!(by_invoice.id, order_id);
}
