use crate::db::DbPool;
use crate::entities::coupon::{self, DiscountKind, Entity as Coupon};
use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, instrument};

/// Service for validating and redeeming discount coupons.
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DbPool>,
}

impl CouponService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Looks up a coupon by code and checks it is redeemable at `now`.
    ///
    /// Read-only. A coupon that passes here can still lose the race at
    /// redemption time, which is why `redeem` re-checks every predicate
    /// inside its conditional update.
    #[instrument(skip(self))]
    pub async fn find_valid(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<coupon::Model, ServiceError> {
        let coupon = Coupon::find()
            .filter(coupon::Column::Code.eq(code))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::InvalidCoupon)?;

        validate(&coupon, now)?;
        Ok(coupon)
    }

    /// Atomically consumes one use of the coupon.
    ///
    /// Every eligibility predicate is re-stated in the WHERE clause, so two
    /// racing settlements can both pass `find_valid` but only as many as the
    /// counters allow will see `rows_affected == 1` here. Returns `Ok(false)`
    /// when the coupon lost eligibility between validation and redemption.
    pub async fn redeem<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon_id: uuid::Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let result = Coupon::update_many()
            .col_expr(
                coupon::Column::RemainingQuantity,
                Expr::col(coupon::Column::RemainingQuantity).sub(1),
            )
            .col_expr(
                coupon::Column::TotalUsed,
                Expr::col(coupon::Column::TotalUsed).add(1),
            )
            .col_expr(coupon::Column::UpdatedAt, Expr::value(now))
            .filter(coupon::Column::Id.eq(coupon_id))
            .filter(coupon::Column::IsActive.eq(true))
            .filter(coupon::Column::StartsAt.lte(now))
            .filter(coupon::Column::EndsAt.gte(now))
            .filter(coupon::Column::RemainingQuantity.gt(0))
            .filter(
                Condition::any()
                    .add(coupon::Column::MaxUse.eq(0))
                    .add(
                        Expr::col(coupon::Column::TotalUsed)
                            .lt(Expr::col(coupon::Column::MaxUse)),
                    ),
            )
            .exec(conn)
            .await?;

        let redeemed = result.rows_affected > 0;
        if redeemed {
            info!(coupon_id = %coupon_id, "coupon use consumed");
        }
        Ok(redeemed)
    }
}

/// Classifies why a coupon is or is not redeemable at `now`.
pub fn validate(coupon: &coupon::Model, now: DateTime<Utc>) -> Result<(), ServiceError> {
    if !coupon.is_active {
        return Err(ServiceError::InvalidCoupon);
    }
    if now < coupon.starts_at || now > coupon.ends_at {
        return Err(ServiceError::ExpiredCoupon);
    }
    if coupon.remaining_quantity <= 0 {
        return Err(ServiceError::ExhaustedCoupon);
    }
    if coupon.max_use > 0 && coupon.total_used >= coupon.max_use {
        return Err(ServiceError::ExhaustedCoupon);
    }
    Ok(())
}

/// Computes the discount a coupon grants against a subtotal.
///
/// Fixed discounts are not capped at the subtotal; the settlement engine
/// clamps the final total at zero instead.
pub fn discount_amount(coupon: &coupon::Model, subtotal: Decimal) -> Decimal {
    match coupon.kind {
        DiscountKind::Percent => subtotal * coupon.magnitude / Decimal::from(100),
        DiscountKind::Fixed => coupon.magnitude,
    }
}
