// apps/storefront/src/pipelines/contexts.rs

//! Data each workflow pipeline runs over. Handlers receive these wrapped in
//! `storeflow::ContextData`.

use crate::models::{CartLine, Order, Rating, SignUpOutcome, UserProfile};
use crate::persistence::LocalMirror;
use crate::services::auth_service::SignUpInput;
use crate::services::pricing::PriceQuote;
use crate::services::session::SessionUser;
use crate::state::AppState;
use serde::Deserialize;

/// Checkout form as submitted, untrimmed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub delivery_method: String,
  #[serde(default)]
  pub payment_method: String,
}

#[derive(Clone)]
pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub access_token: Option<String>,
  pub mirror: LocalMirror,
  pub form: CheckoutForm,
  /// The checkout snapshot being ordered.
  pub lines: Vec<CartLine>,
  pub user: Option<SessionUser>,
  pub quote: Option<PriceQuote>,
  pub order: Option<Order>,
  /// Where the front-end goes once the order exists.
  pub next_page: Option<String>,
}

impl PlaceOrderCtxData {
  pub fn new(
    app_state: AppState,
    access_token: Option<String>,
    mirror: LocalMirror,
    form: CheckoutForm,
    lines: Vec<CartLine>,
  ) -> Self {
    Self {
      app_state,
      access_token,
      mirror,
      form,
      lines,
      user: None,
      quote: None,
      order: None,
      next_page: None,
    }
  }
}

/// An uploaded proof-of-payment image.
#[derive(Debug, Clone)]
pub struct ProofFile {
  pub file_name: String,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct SubmitProofCtxData {
  pub app_state: AppState,
  pub user: SessionUser,
  pub order_id: String,
  pub file: ProofFile,
  pub order: Option<Order>,
  pub proof_path: Option<String>,
  pub proof_url: Option<String>,
}

#[derive(Clone)]
pub struct SimulatePaymentCtxData {
  pub app_state: AppState,
  pub user: SessionUser,
  pub order_id: String,
  pub order: Option<Order>,
}

/// Stars picked for one product; zero means none.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingEntry {
  pub product_id: String,
  #[serde(default)]
  pub rating: u8,
  #[serde(default)]
  pub review: Option<String>,
}

#[derive(Clone)]
pub struct SubmitRatingsCtxData {
  pub app_state: AppState,
  pub user: SessionUser,
  pub order_id: String,
  pub entries: Vec<RatingEntry>,
  pub ratings: Vec<Rating>,
}

#[derive(Clone)]
pub struct SignUpCtxData {
  pub app_state: AppState,
  pub input: SignUpInput,
  pub outcome: Option<SignUpOutcome>,
  /// Set when the provider signed the new account in straight away.
  pub user: Option<SessionUser>,
}

#[derive(Clone)]
pub struct SignInCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub user: Option<SessionUser>,
  pub profile: Option<UserProfile>,
}

#[derive(Clone)]
pub struct UpdateProfileCtxData {
  pub app_state: AppState,
  pub user: SessionUser,
  pub full_name: String,
  pub phone: String,
  pub address: String,
  pub profile: Option<UserProfile>,
}
