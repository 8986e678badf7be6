// apps/storefront/src/services/cart.rs

//! The cart state machine.
//!
//! Lines are kept in insertion order, one per product, each with a quantity
//! between 1 and [`MAX_LINE_QUANTITY`]. Every mutation is written through to the device's local
//! mirror before the call returns.

use crate::errors::AppError;
use crate::models::CartLine;
use crate::notice::Notice;
use crate::persistence::LocalMirror;
use crate::services::catalog::Catalog;
use crate::services::session::SessionUser;
use tracing::{debug, instrument, warn};

/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 999;

pub struct Cart {
  lines: Vec<CartLine>,
  mirror: LocalMirror,
  notices: Vec<Notice>,
}

impl Cart {
  /// Restores the cart from the mirror; empty if nothing readable is stored.
  ///
  /// Zero-quantity lines are dropped, repeated products are merged into their
  /// first line and quantities are capped.
  pub fn load(mirror: LocalMirror) -> Self {
    let stored = mirror.load_cart();
    let stored_count = stored.len();
    let mut lines: Vec<CartLine> = Vec::with_capacity(stored_count);
    for line in stored.into_iter().filter(|l| l.quantity > 0) {
      match lines.iter_mut().find(|l| l.product_id == line.product_id) {
        Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
        None => lines.push(line),
      }
    }
    for line in &mut lines {
      line.quantity = line.quantity.min(MAX_LINE_QUANTITY);
    }
    if lines.len() != stored_count {
      warn!(
        stored = stored_count,
        kept = lines.len(),
        "Normalised stored cart lines (zero quantities or repeated products)."
      );
    }
    Self {
      lines,
      mirror,
      notices: Vec::new(),
    }
  }

  pub fn lines(&self) -> &[CartLine] {
    &self.lines
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn quantity_of(&self, product_id: &str) -> Option<u32> {
    self.lines.iter().find(|l| l.product_id == product_id).map(|l| l.quantity)
  }

  /// Adds one unit of a catalog product. Unknown ids leave the cart as is and
  /// queue an error notice.
  #[instrument(name = "Cart::add", skip(self, catalog))]
  pub fn add(&mut self, catalog: &Catalog, product_id: &str) -> bool {
    let Some(product) = catalog.find(product_id) else {
      warn!("Product not found in the loaded catalog.");
      self.notices.push(Notice::error("Product not found"));
      return false;
    };

    match self.lines.iter_mut().find(|l| l.product_id == product_id) {
      Some(line) if line.quantity >= MAX_LINE_QUANTITY => {
        warn!(quantity = line.quantity, "Cart line is already at the maximum quantity.");
        self.notices.push(max_quantity_notice());
        return false;
      }
      Some(line) => line.quantity += 1,
      None => self.lines.push(CartLine::from_product(product)),
    }
    self.persist();
    self.notices.push(Notice::success(format!("{} added to cart", product.name)));
    true
  }

  /// Applies `delta` to a line's quantity, removing it at zero or below and
  /// capping it at [`MAX_LINE_QUANTITY`]. Unknown ids are ignored.
  #[instrument(name = "Cart::update_quantity", skip(self))]
  pub fn update_quantity(&mut self, product_id: &str, delta: i64) {
    let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else {
      debug!("No cart line for product; nothing to update.");
      return;
    };
    let next = i64::from(line.quantity).saturating_add(delta);
    if next <= 0 {
      self.remove(product_id);
      return;
    }
    if next > i64::from(MAX_LINE_QUANTITY) {
      warn!(requested = next, "Cart quantity capped.");
      line.quantity = MAX_LINE_QUANTITY;
      self.notices.push(max_quantity_notice());
    } else {
      line.quantity = next as u32;
    }
    self.persist();
  }

  #[instrument(name = "Cart::remove", skip(self))]
  pub fn remove(&mut self, product_id: &str) {
    self.lines.retain(|l| l.product_id != product_id);
    self.persist();
    self.notices.push(Notice::success("Item removed from cart"));
  }

  pub fn clear(&mut self) {
    self.lines.clear();
    self.persist();
  }

  /// Σ unit price × quantity.
  pub fn total(&self) -> i64 {
    self.lines.iter().map(CartLine::line_total).sum()
  }

  /// Σ quantity, for the cart badge.
  pub fn item_count(&self) -> u32 {
    self.lines.iter().fold(0u32, |count, l| count.saturating_add(l.quantity))
  }

  /// Notices queued by the mutations since the last call.
  pub fn take_notices(&mut self) -> Vec<Notice> {
    std::mem::take(&mut self.notices)
  }

  /// Copies the cart to the checkout snapshot for a signed-in user.
  pub fn proceed_to_checkout(&self, user: Option<&SessionUser>) -> Result<(), AppError> {
    if user.is_none() {
      return Err(AppError::not_signed_in());
    }
    if self.lines.is_empty() {
      return Err(AppError::Validation("Your cart is empty".to_string()));
    }
    if !self.mirror.save_checkout(&self.lines) {
      return Err(AppError::Internal("Could not save the checkout snapshot".to_string()));
    }
    Ok(())
  }

  fn persist(&self) {
    self.mirror.save_cart(&self.lines);
  }
}

fn max_quantity_notice() -> Notice {
  Notice::error(format!("Maximum quantity per item is {}", MAX_LINE_QUANTITY))
}
