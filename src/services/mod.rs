pub mod carts;
pub mod checkout;
pub mod coupons;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod shipping;

pub use carts::CartService;
pub use checkout::{CheckoutService, SettleCheckoutInput, SettledOrder};
pub use coupons::CouponService;
pub use orders::OrderService;
pub use products::ProductService;
