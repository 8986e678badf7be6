// apps/storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A catalog row. Prices are whole rupiah.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Product {
  pub id: String,
  pub name: String,
  #[serde(deserialize_with = "super::de_amount")]
  pub price: i64,
  pub image_url: String,
  pub rating: f64,
  pub category: String,
  pub stock: i32,
  pub description: String,
  pub is_available: bool,
  pub created_at: Option<DateTime<Utc>>,
}
