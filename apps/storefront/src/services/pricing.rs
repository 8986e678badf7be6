// apps/storefront/src/services/pricing.rs

use crate::format::format_currency;
use crate::models::CartLine;
use serde::Serialize;

/// Courier delivery; the only method that carries a fee.
pub const GOSEND: &str = "gosend";
pub const PICKUP: &str = "pickup";

pub fn delivery_fee(delivery_method: &str, flat_fee: i64) -> i64 {
  if delivery_method == GOSEND {
    flat_fee
  } else {
    0
  }
}

/// Price summary shown on the checkout page and charged on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
  pub subtotal: i64,
  pub delivery_fee: i64,
  pub total: i64,
  pub subtotal_display: String,
  pub delivery_fee_display: String,
  pub total_display: String,
}

impl PriceQuote {
  pub fn for_lines(lines: &[CartLine], delivery_method: &str, flat_fee: i64) -> Self {
    let subtotal: i64 = lines.iter().map(CartLine::line_total).sum();
    let delivery_fee = delivery_fee(delivery_method, flat_fee);
    let total = subtotal + delivery_fee;
    Self {
      subtotal,
      delivery_fee,
      total,
      subtotal_display: format_currency(subtotal),
      delivery_fee_display: format_currency(delivery_fee),
      total_display: format_currency(total),
    }
  }
}
