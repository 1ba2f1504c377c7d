//! SeaORM entities backing the marketplace tables.

pub mod cart_item;
pub mod coupon;
pub mod order;
pub mod order_item;
pub mod product;
pub mod shipping_rule;

// Re-export entities
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use coupon::{DiscountKind, Entity as Coupon, Model as CouponModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use shipping_rule::{Entity as ShippingRule, Model as ShippingRuleModel, ShippingKind};
