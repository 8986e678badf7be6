// apps/storefront/src/pages/storefront.rs

use crate::errors::AppError;
use crate::format::format_currency;
use crate::models::{CartLine, Product};
use crate::notice::Notice;
use crate::services::cart::Cart;
use crate::services::catalog::{fetch_catalog, Catalog};
use crate::services::session::SessionUser;
use crate::state::{AppState, DeviceLock};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ProductListing {
  pub products: Vec<Product>,
  pub categories: Vec<String>,
  pub is_fallback: bool,
  pub cart_count: u32,
  pub user: Option<SessionUser>,
}

#[derive(Debug, Serialize)]
pub struct CartView {
  pub lines: Vec<CartLine>,
  pub item_count: u32,
  pub total: i64,
  pub total_display: String,
  pub notices: Vec<Notice>,
}

/// The shop front: catalog, filters and the device's cart.
///
/// Holds the device lock for its whole life, so cart actions from the same
/// device run one at a time.
pub struct StorefrontPage {
  state: AppState,
  user: Option<SessionUser>,
  catalog: Option<Catalog>,
  cart: Cart,
  _device_lock: DeviceLock,
}

impl StorefrontPage {
  #[instrument(name = "StorefrontPage::open", skip(state, access_token))]
  pub async fn open(state: &AppState, access_token: Option<&str>, device_id: Uuid) -> Self {
    let device_lock = state.lock_device(device_id).await;
    let user = state.gate.current_user(access_token).await;
    Self {
      state: state.clone(),
      user,
      catalog: None,
      cart: Cart::load(state.mirror_for(device_id)),
      _device_lock: device_lock,
    }
  }

  pub fn user(&self) -> Option<&SessionUser> {
    self.user.as_ref()
  }

  /// Loads the catalog on first use.
  pub async fn catalog(&mut self) -> &Catalog {
    if self.catalog.is_none() {
      self.catalog = Some(fetch_catalog(self.state.backend.rows.as_ref()).await);
    }
    self.catalog.get_or_insert_with(Catalog::fallback)
  }

  pub async fn products(&mut self, category: &str, search: &str) -> ProductListing {
    let cart_count = self.cart.item_count();
    let user = self.user.clone();
    let catalog = self.catalog().await;
    ProductListing {
      products: catalog.filter(category, search).into_iter().cloned().collect(),
      categories: catalog.categories().into_iter().map(str::to_string).collect(),
      is_fallback: catalog.is_fallback(),
      cart_count,
      user,
    }
  }

  pub async fn add_to_cart(&mut self, product_id: &str) -> CartView {
    let catalog = match self.catalog.take() {
      Some(catalog) => catalog,
      None => fetch_catalog(self.state.backend.rows.as_ref()).await,
    };
    self.cart.add(&catalog, product_id);
    self.catalog = Some(catalog);
    self.cart_view()
  }

  pub fn update_quantity(&mut self, product_id: &str, delta: i64) -> CartView {
    self.cart.update_quantity(product_id, delta);
    self.cart_view()
  }

  pub fn remove_from_cart(&mut self, product_id: &str) -> CartView {
    self.cart.remove(product_id);
    self.cart_view()
  }

  pub fn clear_cart(&mut self) -> CartView {
    self.cart.clear();
    self.cart_view()
  }

  /// Hands the cart to the checkout page; the front-end moves on to it.
  pub fn proceed_to_checkout(&self) -> Result<&'static str, AppError> {
    self.cart.proceed_to_checkout(self.user.as_ref())?;
    Ok("checkout.html")
  }

  /// Current cart plus the notices its last mutations raised.
  pub fn cart_view(&mut self) -> CartView {
    let total = self.cart.total();
    CartView {
      lines: self.cart.lines().to_vec(),
      item_count: self.cart.item_count(),
      total,
      total_display: format_currency(total),
      notices: self.cart.take_notices(),
    }
  }
}
