use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discount coupon with an inclusive activity window and redemption counters.
///
/// Invariants: `remaining_quantity` only ever decreases, `total_used` only
/// ever increases, and `total_used <= max_use` when `max_use > 0`
/// (`max_use == 0` means no total-use cap). Both counters are mutated only
/// by the atomic redemption in `services::coupons`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub kind: DiscountKind,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub magnitude: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub remaining_quantity: i32,
    pub max_use: i32,
    pub total_used: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Discount kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `magnitude` is a percentage of the subtotal.
    #[sea_orm(string_value = "percent")]
    Percent,
    /// `magnitude` is a fixed amount.
    #[sea_orm(string_value = "fixed")]
    Fixed,
}
