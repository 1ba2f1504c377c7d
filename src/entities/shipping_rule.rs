use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shipping rule applied at checkout.
///
/// `flat_cost` is the charged amount for `Flat` rules and the fallback cost
/// for `ThresholdFree` rules whose subtotal is below `free_over`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipping_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub kind: ShippingKind,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub flat_cost: Decimal,
    /// Minimum subtotal for free shipping under `ThresholdFree`.
    /// Null means the threshold is always met.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub free_over: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Shipping rule kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ShippingKind {
    #[sea_orm(string_value = "flat")]
    Flat,
    #[sea_orm(string_value = "free")]
    Free,
    #[sea_orm(string_value = "threshold_free")]
    ThresholdFree,
}
