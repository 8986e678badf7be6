// apps/storefront/src/backend/mod.rs

//! Remote collaborators: identity provider, row store and blob store.
//!
//! Each is a trait so the workflows can run against the hosted REST service,
//! a direct Postgres connection, or the in-memory backend used by the tests.

pub mod memory;
pub mod pg;
pub mod rest;

use crate::config::{AppConfig, BackendMode};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewOrder, Order, OrderLine, PaymentUpdate, Product, Rating, Session, SignUpOutcome, UserProfile};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
  #[error("{0}")]
  Transport(String),

  /// Non-success HTTP status with the service's message.
  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },

  #[error("{0}")]
  Database(#[from] sqlx::Error),

  #[error("unexpected response: {0}")]
  Decode(String),

  /// The identity provider refused the request; the message is its own.
  #[error("{0}")]
  Auth(String),

  #[error("{0}")]
  Unavailable(String),

  #[error("row not found")]
  NotFound,
}

impl From<reqwest::Error> for BackendError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      BackendError::Decode(err.to_string())
    } else {
      BackendError::Transport(err.to_string())
    }
  }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
  /// Resolves an access token; `None` when it is unknown or expired.
  async fn get_session(&self, access_token: &str) -> BackendResult<Option<Session>>;
  async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session>;
  async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> BackendResult<SignUpOutcome>;
  async fn sign_out(&self, access_token: &str) -> BackendResult<()>;
}

#[async_trait]
pub trait RowStore: Send + Sync {
  /// Products flagged available, newest first.
  async fn available_products(&self) -> BackendResult<Vec<Product>>;

  async fn find_profile(&self, user_id: &str) -> BackendResult<Option<UserProfile>>;
  async fn insert_profile(&self, profile: &UserProfile) -> BackendResult<()>;
  async fn update_profile_contact(&self, user_id: &str, full_name: &str, phone: &str, address: &str)
    -> BackendResult<()>;

  /// Inserts the header and returns the stored row with its id.
  async fn insert_order(&self, order: &NewOrder) -> BackendResult<Order>;
  async fn insert_order_lines(&self, lines: &[OrderLine]) -> BackendResult<()>;
  /// Order with its lines.
  async fn find_order(&self, order_id: &str) -> BackendResult<Option<Order>>;
  /// A user's orders with their lines, newest first.
  async fn orders_for_user(&self, user_id: &str) -> BackendResult<Vec<Order>>;
  async fn update_order_payment(&self, order_id: &str, update: &PaymentUpdate) -> BackendResult<()>;

  async fn ratings_for_order(&self, user_id: &str, order_id: &str) -> BackendResult<Vec<Rating>>;
  /// Inserts or overwrites on `(user_id, order_id, product_id)`.
  async fn upsert_ratings(&self, ratings: &[Rating]) -> BackendResult<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
  async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> BackendResult<()>;
  fn public_url(&self, path: &str) -> String;
}

/// The three collaborators a running storefront talks to.
#[derive(Clone)]
pub struct Backend {
  pub identity: Arc<dyn IdentityProvider>,
  pub rows: Arc<dyn RowStore>,
  pub blobs: Arc<dyn BlobStore>,
}

impl Backend {
  /// Single in-memory instance serving all three roles.
  pub fn in_memory(mem: Arc<memory::MemoryBackend>) -> Self {
    Self {
      identity: mem.clone(),
      rows: mem.clone(),
      blobs: mem,
    }
  }

  /// Builds the collaborators selected by `config.backend_mode`.
  #[tracing::instrument(name = "Backend::connect", skip_all, fields(mode = ?config.backend_mode), err(Display))]
  pub async fn connect(config: &AppConfig) -> AppResult<Self> {
    match config.backend_mode {
      BackendMode::Memory => {
        tracing::warn!("Using the in-memory backend; nothing will survive a restart.");
        Ok(Self::in_memory(Arc::new(memory::MemoryBackend::seeded())))
      }
      BackendMode::Supabase => {
        let client = Arc::new(rest::SupabaseClient::from_config(config)?);
        Ok(Self {
          identity: client.clone(),
          rows: client.clone(),
          blobs: client,
        })
      }
      BackendMode::Postgres => {
        let client = Arc::new(rest::SupabaseClient::from_config(config)?);
        let database_url = config
          .database_url
          .as_deref()
          .ok_or_else(|| AppError::Config("DATABASE_URL is required when BACKEND_MODE=postgres".to_string()))?;
        let rows = pg::PgRowStore::connect(database_url)
          .await
          .map_err(AppError::backend("Connect to database"))?;
        Ok(Self {
          identity: client.clone(),
          rows: Arc::new(rows),
          blobs: client,
        })
      }
    }
  }
}
