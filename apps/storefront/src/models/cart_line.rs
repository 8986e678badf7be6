// apps/storefront/src/models/cart_line.rs

use crate::models::Product;
use serde::{Deserialize, Serialize};

/// One product in the cart. Stored in the local mirror under the field
/// names the front-end already reads (`id`, `price`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  #[serde(rename = "id")]
  pub product_id: String,
  pub name: String,
  #[serde(rename = "price")]
  pub unit_price: i64,
  #[serde(default)]
  pub image_url: String,
  pub quantity: u32,
}

impl CartLine {
  pub fn from_product(product: &Product) -> Self {
    Self {
      product_id: product.id.clone(),
      name: product.name.clone(),
      unit_price: product.price,
      image_url: product.image_url.clone(),
      quantity: 1,
    }
  }

  pub fn line_total(&self) -> i64 {
    self.unit_price * i64::from(self.quantity)
  }
}
