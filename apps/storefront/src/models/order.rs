// apps/storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  WaitingConfirmation,
  Processing,
  Shipping,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 6] = [
    OrderStatus::Pending,
    OrderStatus::WaitingConfirmation,
    OrderStatus::Processing,
    OrderStatus::Shipping,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::WaitingConfirmation => "waiting_confirmation",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipping => "shipping",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  /// Customer-facing label.
  pub fn label(self) -> &'static str {
    match self {
      OrderStatus::Pending => "Awaiting Payment",
      OrderStatus::WaitingConfirmation => "Awaiting Confirmation",
      OrderStatus::Processing => "Processing",
      OrderStatus::Shipping => "Shipping",
      OrderStatus::Completed => "Completed",
      OrderStatus::Cancelled => "Cancelled",
    }
  }

  /// States reachable from this one.
  pub fn next_states(self) -> &'static [OrderStatus] {
    match self {
      OrderStatus::Pending => &[OrderStatus::WaitingConfirmation, OrderStatus::Processing],
      OrderStatus::WaitingConfirmation => &[OrderStatus::Processing, OrderStatus::Cancelled],
      OrderStatus::Processing => &[OrderStatus::Shipping, OrderStatus::Cancelled],
      OrderStatus::Shipping => &[OrderStatus::Completed],
      OrderStatus::Completed | OrderStatus::Cancelled => &[],
    }
  }

  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    self.next_states().contains(&next)
  }

  /// A proof of payment may be (re)submitted while the order awaits payment
  /// or confirmation.
  pub fn accepts_payment_proof(self) -> bool {
    matches!(self, OrderStatus::Pending | OrderStatus::WaitingConfirmation)
  }

  pub fn is_terminal(self) -> bool {
    self.next_states().is_empty()
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| format!("unknown order status '{}'", s))
  }
}

impl TryFrom<String> for OrderStatus {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
  pub id: String,
  pub order_number: String,
  pub user_id: String,
  #[serde(deserialize_with = "super::de_amount")]
  pub total_amount: i64,
  #[sqlx(try_from = "String")]
  pub status: OrderStatus,
  pub payment_method: String,
  pub delivery_method: String,
  /// `name\nphone\naddress`
  pub delivery_address: String,
  #[serde(default)]
  pub payment_proof_url: Option<String>,
  #[serde(default)]
  pub is_preorder: bool,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[sqlx(skip)]
  #[serde(default, rename = "order_items")]
  pub lines: Vec<OrderLine>,
}

/// Header written when an order is placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
  pub user_id: String,
  pub order_number: String,
  pub total_amount: i64,
  pub status: OrderStatus,
  pub payment_method: String,
  pub delivery_address: String,
  pub delivery_method: String,
  pub is_preorder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
  pub order_id: String,
  pub product_id: String,
  pub product_name: String,
  #[serde(deserialize_with = "super::de_amount")]
  pub product_price: i64,
  pub quantity: i32,
  #[serde(deserialize_with = "super::de_amount")]
  pub subtotal: i64,
}

/// Fields changed when payment is proven or simulated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentUpdate {
  pub status: OrderStatus,
  pub payment_proof_url: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transition_table() {
    use OrderStatus::*;
    assert!(Pending.can_transition_to(WaitingConfirmation));
    assert!(Pending.can_transition_to(Processing));
    assert!(!Pending.can_transition_to(Completed));
    assert!(WaitingConfirmation.can_transition_to(Processing));
    assert!(WaitingConfirmation.can_transition_to(Cancelled));
    assert!(Processing.can_transition_to(Shipping));
    assert!(Shipping.can_transition_to(Completed));
    assert!(Completed.is_terminal());
    assert!(Cancelled.is_terminal());
    assert!(!Processing.accepts_payment_proof());
    assert!(WaitingConfirmation.accepts_payment_proof());
  }

  #[test]
  fn status_round_trips_through_its_wire_name() {
    for status in OrderStatus::ALL {
      assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
      let json = serde_json::to_string(&status).expect("serialize");
      assert_eq!(json, format!("\"{}\"", status.as_str()));
    }
    assert!("paid".parse::<OrderStatus>().is_err());
  }

  #[test]
  fn order_decodes_numeric_amounts_and_nested_lines() {
    let raw = r#"{
      "id": "6f1c", "order_number": "SW202401150042", "user_id": "u1",
      "total_amount": 125000.0, "status": "pending", "payment_method": "qris",
      "delivery_method": "gosend", "delivery_address": "Budi\n0812\nJl. Mawar 1",
      "payment_proof_url": null, "is_preorder": false,
      "created_at": "2024-01-15T10:00:00+00:00",
      "order_items": [{"order_id": "6f1c", "product_id": "p1", "product_name": "Strawberry Dream Cake",
        "product_price": "55000", "quantity": 2, "subtotal": 110000}]
    }"#;
    let order: Order = serde_json::from_str(raw).expect("decode");
    assert_eq!(order.total_amount, 125000);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].product_price, 55000);
  }
}
