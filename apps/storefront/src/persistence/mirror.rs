// apps/storefront/src/persistence/mirror.rs

use super::kv::{KeyValueStore, MirrorError};
use crate::models::CartLine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Live cart contents.
pub const CART_KEY: &str = "sweetify_cart";
/// Cart snapshot handed from the cart to the checkout page.
pub const CHECKOUT_KEY: &str = "sweetify_checkout_cart";

/// JSON view over a `KeyValueStore`, scoped to one device.
///
/// Storage failures are logged and swallowed: reads come back empty and
/// writes report `false`. Nothing here returns an error to the caller.
#[derive(Clone)]
pub struct LocalMirror {
  store: Arc<dyn KeyValueStore>,
  namespace: String,
}

impl LocalMirror {
  pub fn for_device(store: Arc<dyn KeyValueStore>, device_id: Uuid) -> Self {
    Self {
      store,
      namespace: device_id.simple().to_string(),
    }
  }

  fn full_key(&self, key: &str) -> String {
    format!("{}:{}", self.namespace, key)
  }

  pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let full_key = self.full_key(key);
    let decoded: Result<Option<T>, MirrorError> = self.store.get(&full_key).and_then(|raw| match raw {
      Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
      None => Ok(None),
    });
    match decoded {
      Ok(value) => value,
      Err(e) => {
        warn!(key = %full_key, error = %e, "Could not read from the local mirror.");
        None
      }
    }
  }

  pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
    let full_key = self.full_key(key);
    let written = serde_json::to_string(value)
      .map_err(MirrorError::from)
      .and_then(|raw| self.store.set(&full_key, &raw));
    match written {
      Ok(()) => {
        debug!(key = %full_key, "Local mirror updated.");
        true
      }
      Err(e) => {
        warn!(key = %full_key, error = %e, "Could not write to the local mirror.");
        false
      }
    }
  }

  pub fn remove(&self, key: &str) -> bool {
    let full_key = self.full_key(key);
    match self.store.remove(&full_key) {
      Ok(()) => true,
      Err(e) => {
        warn!(key = %full_key, error = %e, "Could not remove from the local mirror.");
        false
      }
    }
  }

  /// Raw stored text, for comparing against a serialized cart.
  pub fn read_raw(&self, key: &str) -> Option<String> {
    self.store.get(&self.full_key(key)).ok().flatten()
  }

  pub fn load_cart(&self) -> Vec<CartLine> {
    self.read_json(CART_KEY).unwrap_or_default()
  }

  pub fn save_cart(&self, lines: &[CartLine]) -> bool {
    self.write_json(CART_KEY, lines)
  }

  pub fn load_checkout(&self) -> Vec<CartLine> {
    self.read_json(CHECKOUT_KEY).unwrap_or_default()
  }

  pub fn save_checkout(&self, lines: &[CartLine]) -> bool {
    self.write_json(CHECKOUT_KEY, lines)
  }

  /// Drops both the live cart and the checkout snapshot.
  pub fn clear_after_order(&self) -> bool {
    let cart = self.remove(CART_KEY);
    let checkout = self.remove(CHECKOUT_KEY);
    cart && checkout
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::persistence::kv::MemoryKv;

  fn line(id: &str, qty: u32) -> CartLine {
    CartLine {
      product_id: id.to_string(),
      name: format!("Product {}", id),
      unit_price: 1000,
      image_url: String::new(),
      quantity: qty,
    }
  }

  #[test]
  fn devices_do_not_share_carts() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let a = LocalMirror::for_device(store.clone(), Uuid::new_v4());
    let b = LocalMirror::for_device(store, Uuid::new_v4());
    assert!(a.save_cart(&[line("p1", 2)]));
    assert_eq!(a.load_cart().len(), 1);
    assert!(b.load_cart().is_empty());
  }

  #[test]
  fn unreadable_values_load_as_empty() {
    let store = Arc::new(MemoryKv::new());
    let device = Uuid::new_v4();
    store
      .set(&format!("{}:{}", device.simple(), CART_KEY), "{not json")
      .expect("seed");
    let mirror = LocalMirror::for_device(store, device);
    assert!(mirror.load_cart().is_empty());
  }

  #[test]
  fn write_failures_are_contained() {
    let store = Arc::new(MemoryKv::new());
    let mirror = LocalMirror::for_device(store.clone(), Uuid::new_v4());
    store.set_read_only(true);
    assert!(!mirror.save_cart(&[line("p1", 1)]));
    assert!(!mirror.remove(CART_KEY));
    assert!(mirror.load_cart().is_empty());
  }

  #[test]
  fn cart_is_stored_with_front_end_field_names() {
    let mirror = LocalMirror::for_device(Arc::new(MemoryKv::new()), Uuid::new_v4());
    mirror.save_cart(&[line("p3", 1)]);
    let raw = mirror.read_raw(CART_KEY).expect("stored");
    assert_eq!(
      raw,
      r#"[{"id":"p3","name":"Product p3","price":1000,"image_url":"","quantity":1}]"#
    );
  }
}
