// apps/storefront/src/lib.rs

//! Sweetify storefront: cart, checkout, payment, order history and ratings
//! over a hosted backend, served as JSON endpoints by actix-web.

pub mod backend;
pub mod config;
pub mod errors;
pub mod format;
pub mod models;
pub mod notice;
pub mod pages;
pub mod persistence;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

pub use errors::{AppError, Result};
pub use state::AppState;
