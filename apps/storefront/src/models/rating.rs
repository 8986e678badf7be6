// apps/storefront/src/models/rating.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Star rating for one product of one order. Unique per
/// `(user_id, order_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Rating {
  pub user_id: String,
  pub order_id: String,
  pub product_id: String,
  pub rating: i16,
  #[serde(default)]
  pub review: Option<String>,
}

impl Rating {
  pub fn key(&self) -> (String, String, String) {
    (self.user_id.clone(), self.order_id.clone(), self.product_id.clone())
  }
}
