// apps/storefront/src/backend/rest.rs

//! Hosted backend-as-a-service over HTTP: auth (`/auth/v1`), rows
//! (`/rest/v1`, PostgREST filters) and file storage (`/storage/v1`).
//!
//! Every request is sent with the project's anon key.

use super::{BackendError, BackendResult, BlobStore, IdentityProvider, RowStore};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{
  AuthUser, NewOrder, Order, OrderLine, PaymentUpdate, Product, Rating, Session, SignUpOutcome, UserProfile,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const ORDER_WITH_LINES: &str = "*,order_items(order_id,product_id,product_name,product_price,quantity,subtotal)";

pub struct SupabaseClient {
  base_url: String,
  anon_key: String,
  bucket: String,
  http: Client,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
  id: String,
  #[serde(default)]
  email: Option<String>,
  #[serde(default)]
  user_metadata: Value,
}

impl From<RemoteUser> for AuthUser {
  fn from(user: RemoteUser) -> Self {
    let full_name = user
      .user_metadata
      .get("full_name")
      .and_then(Value::as_str)
      .map(str::to_string);
    AuthUser {
      id: user.id,
      email: user.email.unwrap_or_default(),
      full_name,
    }
  }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token: String,
  user: RemoteUser,
}

#[derive(Serialize)]
struct ContactPatch<'a> {
  full_name: &'a str,
  phone: &'a str,
  address: &'a str,
}

impl SupabaseClient {
  pub fn new(base_url: &str, anon_key: &str, bucket: &str, timeout: Duration) -> Result<Self, AppError> {
    let http = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Config(format!("Cannot build HTTP client: {}", e)))?;
    Ok(Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      anon_key: anon_key.to_string(),
      bucket: bucket.to_string(),
      http,
    })
  }

  pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
    let base_url = config
      .supabase_url
      .as_deref()
      .ok_or_else(|| AppError::Config("SUPABASE_URL is not set".to_string()))?;
    let anon_key = config
      .supabase_anon_key
      .as_deref()
      .ok_or_else(|| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;
    Self::new(
      base_url,
      anon_key,
      &config.storage_bucket,
      Duration::from_secs(config.http_timeout_secs),
    )
  }

  fn rest(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
    self
      .http
      .request(method, format!("{}/rest/v1/{}", self.base_url, table))
      .header("apikey", &self.anon_key)
      .bearer_auth(&self.anon_key)
  }

  fn auth(&self, method: reqwest::Method, path: &str, bearer: &str) -> RequestBuilder {
    self
      .http
      .request(method, format!("{}/auth/v1/{}", self.base_url, path))
      .header("apikey", &self.anon_key)
      .bearer_auth(bearer)
  }

  /// Turns a non-success response into `BackendError::Status`, pulling the
  /// message out of whichever field the service used.
  async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
      status: status.as_u16(),
      message: error_message(&text),
    })
  }

  async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> BackendResult<T> {
    let response = Self::check(request.send().await?).await?;
    Ok(response.json::<T>().await?)
  }

  async fn send(request: RequestBuilder) -> BackendResult<()> {
    Self::check(request.send().await?).await?;
    Ok(())
  }
}

/// A filtered PATCH matching nothing still answers 200 with an empty array.
fn require_touched(rows: Vec<Value>) -> BackendResult<()> {
  if rows.is_empty() {
    return Err(BackendError::NotFound);
  }
  Ok(())
}

/// Message carried by an error body from any of the three services.
fn error_message(body: &str) -> String {
  let parsed: Value = match serde_json::from_str(body) {
    Ok(v) => v,
    Err(_) => return body.trim().to_string(),
  };
  ["msg", "message", "error_description", "error"]
    .iter()
    .find_map(|field| parsed.get(*field).and_then(Value::as_str))
    .map(str::to_string)
    .unwrap_or_else(|| body.trim().to_string())
}

/// Auth failures surface with the provider's own wording so the sign-in and
/// sign-up flows can map them to friendly messages.
fn into_auth_error(err: BackendError) -> BackendError {
  match err {
    BackendError::Status { status, message } if (400..500).contains(&status) => BackendError::Auth(message),
    other => other,
  }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
  #[instrument(name = "rest::get_session", skip_all, err(Display))]
  async fn get_session(&self, access_token: &str) -> BackendResult<Option<Session>> {
    let response = self.auth(reqwest::Method::GET, "user", access_token).send().await?;
    if response.status() == StatusCode::UNAUTHORIZED || response.status() == StatusCode::FORBIDDEN {
      debug!("Access token rejected by the identity provider.");
      return Ok(None);
    }
    let user: RemoteUser = Self::check(response).await?.json().await?;
    Ok(Some(Session {
      access_token: access_token.to_string(),
      user: user.into(),
    }))
  }

  #[instrument(name = "rest::sign_in", skip(self, password), err(Display))]
  async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
    let request = self
      .auth(reqwest::Method::POST, "token", &self.anon_key)
      .query(&[("grant_type", "password")])
      .json(&json!({ "email": email, "password": password }));
    let token: TokenResponse = Self::fetch(request).await.map_err(into_auth_error)?;
    Ok(Session {
      access_token: token.access_token,
      user: token.user.into(),
    })
  }

  #[instrument(name = "rest::sign_up", skip(self, password, full_name), err(Display))]
  async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> BackendResult<SignUpOutcome> {
    let request = self.auth(reqwest::Method::POST, "signup", &self.anon_key).json(&json!({
      "email": email,
      "password": password,
      "data": { "full_name": full_name },
    }));
    let body: Value = Self::fetch(request).await.map_err(into_auth_error)?;

    // With confirmation enabled the body is the bare user; otherwise it is a
    // token response carrying the user.
    if body.get("access_token").is_some() {
      let token: TokenResponse = serde_json::from_value(body).map_err(|e| BackendError::Decode(e.to_string()))?;
      let session = Session {
        access_token: token.access_token,
        user: token.user.into(),
      };
      return Ok(SignUpOutcome {
        user: Some(session.user.clone()),
        session: Some(session),
      });
    }
    let user = match body.get("user").cloned().unwrap_or(body) {
      Value::Null => None,
      raw => Some(
        serde_json::from_value::<RemoteUser>(raw)
          .map_err(|e| BackendError::Decode(e.to_string()))?
          .into(),
      ),
    };
    Ok(SignUpOutcome { user, session: None })
  }

  #[instrument(name = "rest::sign_out", skip_all, err(Display))]
  async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
    Self::send(self.auth(reqwest::Method::POST, "logout", access_token)).await
  }
}

#[async_trait]
impl RowStore for SupabaseClient {
  #[instrument(name = "rest::available_products", skip_all, err(Display))]
  async fn available_products(&self) -> BackendResult<Vec<Product>> {
    let request = self.rest(reqwest::Method::GET, "products").query(&[
      ("select", "*"),
      ("is_available", "eq.true"),
      ("order", "created_at.desc"),
    ]);
    Self::fetch(request).await
  }

  #[instrument(name = "rest::find_profile", skip(self), err(Display))]
  async fn find_profile(&self, user_id: &str) -> BackendResult<Option<UserProfile>> {
    let filter = format!("eq.{}", user_id);
    let request = self
      .rest(reqwest::Method::GET, "user_profiles")
      .query(&[("select", "*"), ("id", filter.as_str())]);
    let rows: Vec<UserProfile> = Self::fetch(request).await?;
    Ok(rows.into_iter().next())
  }

  #[instrument(name = "rest::insert_profile", skip_all, fields(user_id = %profile.id), err(Display))]
  async fn insert_profile(&self, profile: &UserProfile) -> BackendResult<()> {
    Self::send(self.rest(reqwest::Method::POST, "user_profiles").json(profile)).await
  }

  #[instrument(name = "rest::update_profile_contact", skip(self, full_name, phone, address), err(Display))]
  async fn update_profile_contact(
    &self,
    user_id: &str,
    full_name: &str,
    phone: &str,
    address: &str,
  ) -> BackendResult<()> {
    let filter = format!("eq.{}", user_id);
    let request = self
      .rest(reqwest::Method::PATCH, "user_profiles")
      .query(&[("id", filter.as_str())])
      .json(&ContactPatch {
        full_name,
        phone,
        address,
      });
    Self::send(request).await
  }

  #[instrument(name = "rest::insert_order", skip_all, fields(order_number = %order.order_number), err(Display))]
  async fn insert_order(&self, order: &NewOrder) -> BackendResult<Order> {
    let request = self
      .rest(reqwest::Method::POST, "orders")
      .header("Prefer", "return=representation")
      .json(order);
    let rows: Vec<Order> = Self::fetch(request).await?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| BackendError::Decode("order insert returned no row".to_string()))
  }

  #[instrument(name = "rest::insert_order_lines", skip_all, fields(count = lines.len()), err(Display))]
  async fn insert_order_lines(&self, lines: &[OrderLine]) -> BackendResult<()> {
    Self::send(self.rest(reqwest::Method::POST, "order_items").json(lines)).await
  }

  #[instrument(name = "rest::find_order", skip(self), err(Display))]
  async fn find_order(&self, order_id: &str) -> BackendResult<Option<Order>> {
    let filter = format!("eq.{}", order_id);
    let request = self
      .rest(reqwest::Method::GET, "orders")
      .query(&[("select", ORDER_WITH_LINES), ("id", filter.as_str())]);
    let rows: Vec<Order> = Self::fetch(request).await?;
    Ok(rows.into_iter().next())
  }

  #[instrument(name = "rest::orders_for_user", skip(self), err(Display))]
  async fn orders_for_user(&self, user_id: &str) -> BackendResult<Vec<Order>> {
    let filter = format!("eq.{}", user_id);
    let request = self.rest(reqwest::Method::GET, "orders").query(&[
      ("select", ORDER_WITH_LINES),
      ("user_id", filter.as_str()),
      ("order", "created_at.desc"),
    ]);
    Self::fetch(request).await
  }

  #[instrument(name = "rest::update_order_payment", skip(self, update), fields(status = %update.status), err(Display))]
  async fn update_order_payment(&self, order_id: &str, update: &PaymentUpdate) -> BackendResult<()> {
    let filter = format!("eq.{}", order_id);
    let request = self
      .rest(reqwest::Method::PATCH, "orders")
      .query(&[("id", filter.as_str()), ("select", "id")])
      .header("Prefer", "return=representation")
      .json(update);
    let rows: Vec<Value> = Self::fetch(request).await?;
    require_touched(rows)
  }

  #[instrument(name = "rest::ratings_for_order", skip(self), err(Display))]
  async fn ratings_for_order(&self, user_id: &str, order_id: &str) -> BackendResult<Vec<Rating>> {
    let user_filter = format!("eq.{}", user_id);
    let order_filter = format!("eq.{}", order_id);
    let request = self.rest(reqwest::Method::GET, "product_ratings").query(&[
      ("select", "user_id,order_id,product_id,rating,review"),
      ("user_id", user_filter.as_str()),
      ("order_id", order_filter.as_str()),
    ]);
    Self::fetch(request).await
  }

  #[instrument(name = "rest::upsert_ratings", skip_all, fields(count = ratings.len()), err(Display))]
  async fn upsert_ratings(&self, ratings: &[Rating]) -> BackendResult<()> {
    let request = self
      .rest(reqwest::Method::POST, "product_ratings")
      .query(&[("on_conflict", "user_id,order_id,product_id")])
      .header("Prefer", "resolution=merge-duplicates")
      .json(ratings);
    Self::send(request).await
  }
}

#[async_trait]
impl BlobStore for SupabaseClient {
  #[instrument(name = "rest::upload", skip(self, bytes), fields(size = bytes.len()), err(Display))]
  async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> BackendResult<()> {
    let request = self
      .http
      .post(format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path))
      .header("apikey", &self.anon_key)
      .bearer_auth(&self.anon_key)
      .header(reqwest::header::CONTENT_TYPE, content_type)
      .body(bytes);
    Self::send(request).await
  }

  fn public_url(&self, path: &str) -> String {
    format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_message_prefers_service_fields() {
    assert_eq!(
      error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
      "Invalid login credentials"
    );
    assert_eq!(error_message(r#"{"msg":"User already registered"}"#), "User already registered");
    assert_eq!(error_message("bad gateway"), "bad gateway");
  }

  #[test]
  fn client_errors_become_auth_errors() {
    let err = into_auth_error(BackendError::Status {
      status: 400,
      message: "Email not confirmed".to_string(),
    });
    assert!(matches!(err, BackendError::Auth(ref m) if m == "Email not confirmed"));

    let err = into_auth_error(BackendError::Status {
      status: 503,
      message: "down".to_string(),
    });
    assert!(matches!(err, BackendError::Status { status: 503, .. }));
  }

  #[test]
  fn patch_that_matched_no_row_is_not_found() {
    assert!(matches!(require_touched(Vec::new()), Err(BackendError::NotFound)));
    assert!(require_touched(vec![json!({"id": "o1"})]).is_ok());
  }

  #[test]
  fn remote_user_reads_full_name_metadata() {
    let raw = json!({"id": "u1", "email": "budi@sweetify.id", "user_metadata": {"full_name": "Budi Santoso"}});
    let user: AuthUser = serde_json::from_value::<RemoteUser>(raw).expect("decode").into();
    assert_eq!(user.full_name.as_deref(), Some("Budi Santoso"));
  }

  #[test]
  fn public_url_points_into_the_bucket() {
    let client = SupabaseClient::new("https://demo.supabase.co/", "anon", "uploads", Duration::from_secs(5))
      .expect("client");
    assert_eq!(
      client.public_url("payment-proofs/o1-1700000000000.png"),
      "https://demo.supabase.co/storage/v1/object/public/uploads/payment-proofs/o1-1700000000000.png"
    );
  }
}
