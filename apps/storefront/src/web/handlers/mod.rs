// apps/storefront/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod cart_handlers;
pub mod checkout_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod profile_handlers;
