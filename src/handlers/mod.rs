pub mod carts;
pub mod checkout;
pub mod common;
pub mod orders;
pub mod products;

pub use carts::cart_routes;
pub use checkout::checkout_routes;
pub use orders::order_routes;
pub use products::product_routes;
