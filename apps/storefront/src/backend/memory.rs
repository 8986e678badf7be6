// apps/storefront/src/backend/memory.rs

//! In-process backend serving all three collaborator roles.
//!
//! Used for offline demos and by the test-suite. Passwords are hashed with
//! argon2; any operation can be made to fail on demand, and every call and
//! write is counted so tests can assert that nothing reached the backend.

use super::{BackendError, BackendResult, BlobStore, IdentityProvider, RowStore};
use crate::models::{
  AuthUser, NewOrder, Order, OrderLine, OrderStatus, PaymentUpdate, Product, Rating, Session, SignUpOutcome,
  UserProfile,
};
use crate::services::{auth_service, catalog};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

struct MemoryUser {
  id: String,
  email: String,
  password_hash: String,
  full_name: String,
  confirmed: bool,
}

#[derive(Default)]
struct Tables {
  users: HashMap<String, MemoryUser>,
  sessions: HashMap<String, String>,
  products: Vec<Product>,
  profiles: HashMap<String, UserProfile>,
  orders: Vec<Order>,
  lines: Vec<OrderLine>,
  ratings: BTreeMap<(String, String, String), Rating>,
  blobs: HashMap<String, (String, Vec<u8>)>,
}

impl Tables {
  fn user_by_id(&self, user_id: &str) -> Option<&MemoryUser> {
    self.users.values().find(|u| u.id == user_id)
  }

  fn with_lines(&self, order: &Order) -> Order {
    let mut order = order.clone();
    order.lines = self.lines.iter().filter(|l| l.order_id == order.id).cloned().collect();
    order
  }
}

fn session_for(user: &MemoryUser, token: String) -> Session {
  Session {
    access_token: token,
    user: AuthUser {
      id: user.id.clone(),
      email: user.email.clone(),
      full_name: Some(user.full_name.clone()).filter(|n| !n.is_empty()),
    },
  }
}

#[derive(Default)]
pub struct MemoryBackend {
  tables: Mutex<Tables>,
  failing: Mutex<HashSet<String>>,
  require_confirmation: AtomicBool,
  calls: AtomicUsize,
  writes: AtomicUsize,
}

impl MemoryBackend {
  /// Empty backend: no products, no users.
  pub fn new() -> Self {
    Self::default()
  }

  /// Backend stocked with the bakery's standard catalog.
  pub fn seeded() -> Self {
    let now = Utc::now();
    let products = catalog::fallback_products()
      .into_iter()
      .enumerate()
      .map(|(idx, mut p)| {
        p.created_at = Some(now - Duration::minutes(idx as i64));
        p
      })
      .collect();
    Self::with_products(products)
  }

  pub fn with_products(products: Vec<Product>) -> Self {
    let backend = Self::new();
    backend.tables.lock().products = products;
    backend
  }

  /// Makes every later call to `operation` fail until `heal` is called.
  pub fn fail_on(&self, operation: &str) {
    self.failing.lock().insert(operation.to_string());
  }

  pub fn heal(&self, operation: &str) {
    self.failing.lock().remove(operation);
  }

  /// When set, sign-up returns no session and sign-in is refused until
  /// `confirm_email` is called.
  pub fn require_email_confirmation(&self, required: bool) {
    self.require_confirmation.store(required, Ordering::SeqCst);
  }

  pub fn confirm_email(&self, email: &str) {
    if let Some(user) = self.tables.lock().users.get_mut(email) {
      user.confirmed = true;
    }
  }

  /// Number of backend operations attempted.
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  /// Number of successful writes.
  pub fn writes(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  /// Moves an order to `status` directly, as the admin side would.
  pub fn set_order_status(&self, order_id: &str, status: OrderStatus) -> bool {
    let mut tables = self.tables.lock();
    match tables.orders.iter_mut().find(|o| o.id == order_id) {
      Some(order) => {
        order.status = status;
        true
      }
      None => false,
    }
  }

  pub fn order(&self, order_id: &str) -> Option<Order> {
    let tables = self.tables.lock();
    tables.orders.iter().find(|o| o.id == order_id).map(|o| tables.with_lines(o))
  }

  pub fn order_count(&self) -> usize {
    self.tables.lock().orders.len()
  }

  pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
    self.tables.lock().profiles.get(user_id).cloned()
  }

  pub fn ratings(&self) -> Vec<Rating> {
    self.tables.lock().ratings.values().cloned().collect()
  }

  pub fn blob(&self, path: &str) -> Option<(String, Vec<u8>)> {
    self.tables.lock().blobs.get(path).cloned()
  }

  pub fn blob_paths(&self) -> Vec<String> {
    self.tables.lock().blobs.keys().cloned().collect()
  }

  fn enter(&self, operation: &str) -> BackendResult<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.failing.lock().contains(operation) {
      warn!(operation, "Injected backend failure.");
      return Err(BackendError::Unavailable(format!("{} is unavailable", operation)));
    }
    debug!(operation, "Memory backend call.");
    Ok(())
  }

  fn wrote(&self) {
    self.writes.fetch_add(1, Ordering::SeqCst);
  }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
  async fn get_session(&self, access_token: &str) -> BackendResult<Option<Session>> {
    self.enter("get_session")?;
    let tables = self.tables.lock();
    let session = tables
      .sessions
      .get(access_token)
      .and_then(|user_id| tables.user_by_id(user_id))
      .map(|user| session_for(user, access_token.to_string()));
    Ok(session)
  }

  async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
    self.enter("sign_in")?;
    let (user_id, password_hash, confirmed) = {
      let tables = self.tables.lock();
      match tables.users.get(email) {
        Some(u) => (u.id.clone(), u.password_hash.clone(), u.confirmed),
        None => return Err(BackendError::Auth("Invalid login credentials".to_string())),
      }
    };

    let matches = auth_service::verify_password(&password_hash, password)
      .map_err(|e| BackendError::Auth(e.to_string()))?;
    if !matches {
      return Err(BackendError::Auth("Invalid login credentials".to_string()));
    }
    if !confirmed {
      return Err(BackendError::Auth("Email not confirmed".to_string()));
    }

    let token = Uuid::new_v4().simple().to_string();
    let mut tables = self.tables.lock();
    tables.sessions.insert(token.clone(), user_id.clone());
    let user = tables
      .user_by_id(&user_id)
      .ok_or_else(|| BackendError::Auth("Invalid login credentials".to_string()))?;
    Ok(session_for(user, token))
  }

  async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> BackendResult<SignUpOutcome> {
    self.enter("sign_up")?;
    if self.tables.lock().users.contains_key(email) {
      return Err(BackendError::Auth("User already registered".to_string()));
    }
    let password_hash = auth_service::hash_password(password).map_err(|e| BackendError::Auth(e.to_string()))?;
    let confirmed = !self.require_confirmation.load(Ordering::SeqCst);

    let user = MemoryUser {
      id: Uuid::new_v4().to_string(),
      email: email.to_string(),
      password_hash,
      full_name: full_name.to_string(),
      confirmed,
    };
    let mut tables = self.tables.lock();
    // Re-checked under the write lock; hashing ran unlocked.
    if tables.users.contains_key(email) {
      return Err(BackendError::Auth("User already registered".to_string()));
    }
    let auth_user = session_for(&user, String::new()).user;
    let session = if confirmed {
      let token = Uuid::new_v4().simple().to_string();
      tables.sessions.insert(token.clone(), user.id.clone());
      Some(session_for(&user, token))
    } else {
      None
    };
    tables.users.insert(email.to_string(), user);
    self.wrote();
    Ok(SignUpOutcome {
      user: Some(auth_user),
      session,
    })
  }

  async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
    self.enter("sign_out")?;
    self.tables.lock().sessions.remove(access_token);
    Ok(())
  }
}

#[async_trait]
impl RowStore for MemoryBackend {
  async fn available_products(&self) -> BackendResult<Vec<Product>> {
    self.enter("available_products")?;
    let mut products: Vec<Product> = self
      .tables
      .lock()
      .products
      .iter()
      .filter(|p| p.is_available)
      .cloned()
      .collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(products)
  }

  async fn find_profile(&self, user_id: &str) -> BackendResult<Option<UserProfile>> {
    self.enter("find_profile")?;
    Ok(self.tables.lock().profiles.get(user_id).cloned())
  }

  async fn insert_profile(&self, profile: &UserProfile) -> BackendResult<()> {
    self.enter("insert_profile")?;
    self
      .tables
      .lock()
      .profiles
      .entry(profile.id.clone())
      .or_insert_with(|| profile.clone());
    self.wrote();
    Ok(())
  }

  async fn update_profile_contact(
    &self,
    user_id: &str,
    full_name: &str,
    phone: &str,
    address: &str,
  ) -> BackendResult<()> {
    self.enter("update_profile_contact")?;
    // Like the REST update: no matching row is not an error.
    if let Some(profile) = self.tables.lock().profiles.get_mut(user_id) {
      profile.full_name = full_name.to_string();
      profile.phone = phone.to_string();
      profile.address = address.to_string();
      self.wrote();
    }
    Ok(())
  }

  async fn insert_order(&self, order: &NewOrder) -> BackendResult<Order> {
    self.enter("insert_order")?;
    let stored = Order {
      id: Uuid::new_v4().to_string(),
      order_number: order.order_number.clone(),
      user_id: order.user_id.clone(),
      total_amount: order.total_amount,
      status: order.status,
      payment_method: order.payment_method.clone(),
      delivery_method: order.delivery_method.clone(),
      delivery_address: order.delivery_address.clone(),
      payment_proof_url: None,
      is_preorder: order.is_preorder,
      created_at: Utc::now(),
      updated_at: None,
      lines: Vec::new(),
    };
    self.tables.lock().orders.push(stored.clone());
    self.wrote();
    Ok(stored)
  }

  async fn insert_order_lines(&self, lines: &[OrderLine]) -> BackendResult<()> {
    self.enter("insert_order_lines")?;
    self.tables.lock().lines.extend_from_slice(lines);
    self.wrote();
    Ok(())
  }

  async fn find_order(&self, order_id: &str) -> BackendResult<Option<Order>> {
    self.enter("find_order")?;
    let tables = self.tables.lock();
    Ok(tables.orders.iter().find(|o| o.id == order_id).map(|o| tables.with_lines(o)))
  }

  async fn orders_for_user(&self, user_id: &str) -> BackendResult<Vec<Order>> {
    self.enter("orders_for_user")?;
    let tables = self.tables.lock();
    let mut orders: Vec<Order> = tables
      .orders
      .iter()
      .rev()
      .filter(|o| o.user_id == user_id)
      .map(|o| tables.with_lines(o))
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn update_order_payment(&self, order_id: &str, update: &PaymentUpdate) -> BackendResult<()> {
    self.enter("update_order_payment")?;
    let mut tables = self.tables.lock();
    let order = tables
      .orders
      .iter_mut()
      .find(|o| o.id == order_id)
      .ok_or(BackendError::NotFound)?;
    order.status = update.status;
    order.payment_proof_url = Some(update.payment_proof_url.clone());
    if update.updated_at.is_some() {
      order.updated_at = update.updated_at;
    }
    self.wrote();
    Ok(())
  }

  async fn ratings_for_order(&self, user_id: &str, order_id: &str) -> BackendResult<Vec<Rating>> {
    self.enter("ratings_for_order")?;
    Ok(
      self
        .tables
        .lock()
        .ratings
        .values()
        .filter(|r| r.user_id == user_id && r.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn upsert_ratings(&self, ratings: &[Rating]) -> BackendResult<()> {
    self.enter("upsert_ratings")?;
    let mut tables = self.tables.lock();
    for rating in ratings {
      tables.ratings.insert(rating.key(), rating.clone());
    }
    self.wrote();
    Ok(())
  }
}

#[async_trait]
impl BlobStore for MemoryBackend {
  async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> BackendResult<()> {
    self.enter("upload")?;
    self
      .tables
      .lock()
      .blobs
      .insert(path.to_string(), (content_type.to_string(), bytes));
    self.wrote();
    Ok(())
  }

  fn public_url(&self, path: &str) -> String {
    format!("memory://uploads/{}", path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn injected_failures_are_counted_and_healable() {
    let backend = MemoryBackend::seeded();
    backend.fail_on("available_products");
    assert!(backend.available_products().await.is_err());
    backend.heal("available_products");
    assert_eq!(backend.available_products().await.map(|p| p.len()).ok(), Some(8));
    assert_eq!(backend.calls(), 2);
    assert_eq!(backend.writes(), 0);
  }

  #[tokio::test]
  async fn sign_up_then_sign_in() {
    let backend = MemoryBackend::new();
    let outcome = backend
      .sign_up("siti@sweetify.id", "rahasia1", "Siti Aminah")
      .await
      .expect("sign up");
    assert!(outcome.session.is_some());

    let session = backend.sign_in("siti@sweetify.id", "rahasia1").await.expect("sign in");
    assert_eq!(session.user.full_name.as_deref(), Some("Siti Aminah"));
    let resolved = backend.get_session(&session.access_token).await.expect("lookup");
    assert_eq!(resolved.map(|s| s.user.id), Some(session.user.id));

    let wrong = backend.sign_in("siti@sweetify.id", "salah123").await;
    assert!(matches!(wrong, Err(BackendError::Auth(ref m)) if m == "Invalid login credentials"));
  }
}
