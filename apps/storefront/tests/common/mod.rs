// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::sync::Arc;
use sweetify_storefront::backend::memory::MemoryBackend;
use sweetify_storefront::backend::{Backend, IdentityProvider};
use sweetify_storefront::config::AppConfig;
use sweetify_storefront::models::Order;
use sweetify_storefront::pages::{CheckoutPage, StorefrontPage};
use sweetify_storefront::persistence::{KeyValueStore, LocalMirror, MemoryKv};
use sweetify_storefront::pipelines::contexts::CheckoutForm;
use sweetify_storefront::services::session::SessionUser;
use sweetify_storefront::state::AppState;
use tracing::Level;
use uuid::Uuid;

pub const PASSWORD: &str = "rahasia1";

/// A storefront wired to the in-memory backend, plus one browser device.
pub struct Harness {
  pub state: AppState,
  pub backend: Arc<MemoryBackend>,
  pub store: Arc<dyn KeyValueStore>,
  pub device: Uuid,
}

impl Harness {
  pub fn mirror(&self) -> LocalMirror {
    self.state.mirror_for(self.device)
  }
}

pub fn harness() -> Harness {
  harness_with(MemoryBackend::seeded(), Arc::new(MemoryKv::new()))
}

pub fn harness_with(backend: MemoryBackend, store: Arc<dyn KeyValueStore>) -> Harness {
  setup_tracing();
  let backend = Arc::new(backend);
  let state = AppState::new(
    Backend::in_memory(backend.clone()),
    Arc::new(AppConfig::default()),
    store.clone(),
  );
  Harness {
    state,
    backend,
    store,
    device: Uuid::new_v4(),
  }
}

/// Registers and signs in a customer straight against the backend.
pub async fn customer(h: &Harness, email: &str, full_name: &str) -> SessionUser {
  let session = h
    .backend
    .sign_up(email, PASSWORD, full_name)
    .await
    .expect("sign up")
    .session
    .expect("confirmed accounts get a session");
  h.state.gate.resolve(session)
}

/// Fills the device's cart with `(product id, quantity)` pairs and hands it
/// to checkout.
pub async fn checkout_snapshot(h: &Harness, user: &SessionUser, items: &[(&str, u32)]) {
  let mut page = StorefrontPage::open(&h.state, Some(&user.access_token), h.device).await;
  for (product_id, quantity) in items {
    for _ in 0..*quantity {
      page.add_to_cart(product_id).await;
    }
  }
  page.proceed_to_checkout().expect("proceed to checkout");
}

/// Places a courier order for `items` and returns the stored header.
pub async fn placed_order(h: &Harness, user: &SessionUser, items: &[(&str, u32)]) -> Order {
  checkout_snapshot(h, user, items).await;
  CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend"))
    .await
    .expect("order placed")
    .order
}

pub fn form(delivery_method: &str) -> CheckoutForm {
  CheckoutForm {
    full_name: "Sari Wulandari".to_string(),
    phone: "081234567890".to_string(),
    address: "Jl. Kenanga No. 3, Bandung".to_string(),
    delivery_method: delivery_method.to_string(),
    payment_method: "qris".to_string(),
  }
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
