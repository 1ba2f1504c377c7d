use crate::db::DbPool;
use crate::entities::{
    cart_item::{self, Entity as CartItem},
    order::{self, OrderStatus},
    order_item,
    product::{self, Entity as Product},
    shipping_rule::{self, Entity as ShippingRule},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{coupons, pricing, shipping, CouponService};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Request payload for settling a user's cart into an order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SettleCheckoutInput {
    pub user_id: Uuid,
    pub address_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
    pub shipping_rule_id: Option<Uuid>,
    pub coupon_code: Option<String>,
}

/// A settled order together with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct SettledOrder {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Settlement engine. Turns a cart into an order in one transaction:
/// price resolution, shipping, coupon redemption, order insertion, stock
/// decrement, and cart clearing all commit or roll back together.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DbPool>,
    coupons: CouponService,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(db: Arc<DbPool>, coupons: CouponService, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            coupons,
            event_sender,
        }
    }

    /// Settles the user's cart into an order.
    ///
    /// Retries the whole transaction once if the database reports a
    /// serialization or lock conflict; any second failure surfaces as
    /// `ConflictRetry` for the client to resubmit.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn settle(&self, input: SettleCheckoutInput) -> Result<SettledOrder, ServiceError> {
        input.validate()?;

        match self.settle_once(&input).await {
            Err(ServiceError::DatabaseError(err)) if is_conflict(&err) => {
                warn!(user_id = %input.user_id, "settlement hit a write conflict, retrying once");
                match self.settle_once(&input).await {
                    Err(ServiceError::DatabaseError(err)) if is_conflict(&err) => {
                        Err(ServiceError::ConflictRetry)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn settle_once(&self, input: &SettleCheckoutInput) -> Result<SettledOrder, ServiceError> {
        // One instant governs offer windows, coupon windows, and timestamps
        // for the whole settlement.
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let lines = CartItem::find()
            .filter(cart_item::Column::UserId.eq(input.user_id))
            .find_also_related(Product)
            .all(&txn)
            .await?;

        if lines.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let mut subtotal = Decimal::ZERO;
        let mut priced_lines = Vec::with_capacity(lines.len());
        for (line, prod) in lines {
            let prod = prod.ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} no longer exists", line.product_id))
            })?;
            let unit_price = pricing::effective_price(&prod, now);
            subtotal += unit_price * Decimal::from(line.quantity);
            priced_lines.push((line, unit_price));
        }

        let shipping_rule = match input.shipping_rule_id {
            Some(rule_id) => {
                let rule = ShippingRule::find_by_id(rule_id)
                    .filter(shipping_rule::Column::IsActive.eq(true))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Shipping rule {} not found", rule_id))
                    })?;
                Some(rule)
            }
            None => None,
        };
        let shipping_cost = shipping::shipping_cost(shipping_rule.as_ref(), subtotal);

        // Coupon redemption happens inside the transaction so a later stock
        // failure also rolls the counters back. A coupon that fails
        // validation or loses the redemption race degrades the order to
        // no-discount rather than failing the settlement.
        let mut discount_total = Decimal::ZERO;
        let mut applied_coupon: Option<coupon_snapshot::Applied> = None;
        if let Some(code) = input.coupon_code.as_deref() {
            match self.try_apply_coupon(&txn, code, subtotal, now).await? {
                Ok(applied) => {
                    discount_total = applied.discount;
                    applied_coupon = Some(applied);
                }
                Err(reason) => {
                    warn!(code = %code, %reason, "coupon not applied, settling without discount");
                }
            }
        }

        let total_amount = order_total(subtotal, shipping_cost, discount_total);
        let item_count: i32 = priced_lines.iter().map(|(l, _)| l.quantity).sum();

        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            invoice_number: Set(generate_invoice_number(order_id)),
            user_id: Set(input.user_id),
            address_id: Set(input.address_id),
            status: Set(OrderStatus::Pending),
            payment_method: Set(input.payment_method.clone()),
            is_paid: Set(false),
            coupon_code: Set(applied_coupon.as_ref().map(|a| a.code.clone())),
            subtotal: Set(subtotal),
            shipping_cost: Set(shipping_cost),
            discount_total: Set(discount_total),
            total_amount: Set(total_amount),
            item_count: Set(item_count),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(priced_lines.len());
        for (line, unit_price) in &priced_lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(*unit_price),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        // Conditional decrement guards against oversell: the row only
        // changes when enough stock remains, and a miss aborts the whole
        // settlement.
        for (line, _) in &priced_lines {
            let result = Product::update_many()
                .col_expr(
                    product::Column::StockQuantity,
                    Expr::col(product::Column::StockQuantity).sub(line.quantity),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(now))
                .filter(product::Column::Id.eq(line.product_id))
                .filter(product::Column::StockQuantity.gte(line.quantity))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "Product {} has fewer than {} units available",
                    line.product_id, line.quantity
                )));
            }
        }

        CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(input.user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            order_id = %order.id,
            invoice = %order.invoice_number,
            total = %order.total_amount,
            "checkout settled"
        );

        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id: order.id,
                user_id: order.user_id,
                total_amount: order.total_amount,
            })
            .await;
        if let Some(applied) = &applied_coupon {
            self.event_sender
                .send_or_log(Event::CouponRedeemed {
                    coupon_id: applied.coupon_id,
                    order_id: order.id,
                })
                .await;
        }
        for (line, _) in &priced_lines {
            self.event_sender
                .send_or_log(Event::StockDecremented {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::CartCleared(input.user_id))
            .await;

        Ok(SettledOrder { order, items })
    }

    /// Validates and redeems a coupon inside the settlement transaction.
    ///
    /// The outer `Result` carries database failures; the inner one carries
    /// the coupon-specific rejection, which the caller downgrades to a
    /// warning.
    async fn try_apply_coupon(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        code: &str,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Result<coupon_snapshot::Applied, ServiceError>, ServiceError> {
        use crate::entities::coupon::{self as coupon_entity, Entity as Coupon};

        let found = Coupon::find()
            .filter(coupon_entity::Column::Code.eq(code))
            .one(txn)
            .await?;

        let coupon = match found {
            Some(c) => c,
            None => return Ok(Err(ServiceError::InvalidCoupon)),
        };
        if let Err(rejection) = coupons::validate(&coupon, now) {
            return Ok(Err(rejection));
        }

        if !self.coupons.redeem(txn, coupon.id, now).await? {
            // Passed validation but lost the counter race.
            return Ok(Err(ServiceError::ExhaustedCoupon));
        }

        Ok(Ok(coupon_snapshot::Applied {
            coupon_id: coupon.id,
            code: coupon.code.clone(),
            discount: coupons::discount_amount(&coupon, subtotal),
        }))
    }

    /// Read-only preview of what a coupon would do against a subtotal.
    /// Unlike settlement, rejections surface as errors so the storefront
    /// can tell the shopper exactly why the code was refused.
    #[instrument(skip(self))]
    pub async fn preview_coupon(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> Result<CouponPreview, ServiceError> {
        let now = Utc::now();
        let coupon = self.coupons.find_valid(code, now).await?;
        let discount = coupons::discount_amount(&coupon, subtotal);

        Ok(CouponPreview {
            code: coupon.code,
            kind: coupon.kind,
            magnitude: coupon.magnitude,
            discount,
        })
    }
}

/// What a coupon would deduct, as reported by the preview endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CouponPreview {
    pub code: String,
    pub kind: crate::entities::coupon::DiscountKind,
    pub magnitude: Decimal,
    pub discount: Decimal,
}

mod coupon_snapshot {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    /// Redeemed-coupon facts carried from redemption to order insertion.
    #[derive(Debug, Clone)]
    pub struct Applied {
        pub coupon_id: Uuid,
        pub code: String,
        pub discount: Decimal,
    }
}

/// Final charge for an order. A large fixed discount can exceed the goods
/// plus shipping; the total floors at zero rather than going negative.
pub fn order_total(subtotal: Decimal, shipping_cost: Decimal, discount_total: Decimal) -> Decimal {
    (subtotal + shipping_cost - discount_total).max(Decimal::ZERO)
}

/// Invoice numbers are derived from the order id, so they inherit its
/// uniqueness without another counter to coordinate.
fn generate_invoice_number(order_id: Uuid) -> String {
    format!("INV-{}", order_id.to_string()[..8].to_uppercase())
}

fn is_conflict(err: &DbErr) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("deadlock")
        || msg.contains("could not serialize")
        || msg.contains("serialization failure")
        || msg.contains("database is locked")
}
