// apps/storefront/src/services/mod.rs

pub mod auth_service;
pub mod cart;
pub mod catalog;
pub mod pricing;
pub mod profile;
pub mod session;
