// apps/storefront/src/models/mod.rs

//! Rows and value types shared by the workflows and the backends.

pub mod cart_line;
pub mod order;
pub mod product;
pub mod profile;
pub mod rating;
pub mod session;

pub use cart_line::CartLine;
pub use order::{NewOrder, Order, OrderLine, OrderStatus, PaymentUpdate};
pub use product::Product;
pub use profile::UserProfile;
pub use rating::Rating;
pub use session::{AuthUser, Capability, Session, SignUpOutcome};

use serde::{Deserialize, Deserializer};

/// Reads a money amount that the row store may hand back as an integer, a
/// float (numeric columns) or a string.
pub(crate) fn de_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Amount {
    Int(i64),
    Float(f64),
    Text(String),
  }

  match Amount::deserialize(deserializer)? {
    Amount::Int(v) => Ok(v),
    Amount::Float(v) => Ok(v.round() as i64),
    Amount::Text(s) => s
      .trim()
      .parse::<f64>()
      .map(|v| v.round() as i64)
      .map_err(serde::de::Error::custom),
  }
}
