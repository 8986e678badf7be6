// apps/storefront/src/web/extractors.rs

//! Request identity: the session token and the device id.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const DEVICE_ID_HEADER: &str = "X-Device-ID";

/// `Authorization: Bearer <token>`, if present. Never rejects a request;
/// the pages decide whether a session is needed.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
  pub fn as_deref(&self) -> Option<&str> {
    self.0.as_deref()
  }
}

impl FromRequest for BearerToken {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = req
      .headers()
      .get(AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.strip_prefix("Bearer "))
      .map(str::trim)
      .filter(|token| !token.is_empty())
      .map(str::to_string);
    ready(Ok(BearerToken(token)))
  }
}

/// The browser's device id, which namespaces its local cart mirror.
#[derive(Debug, Clone, Copy)]
pub struct DeviceId(pub Uuid);

impl FromRequest for DeviceId {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let parsed = req
      .headers()
      .get(DEVICE_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| Uuid::parse_str(value.trim()).ok());
    match parsed {
      Some(device_id) => ready(Ok(DeviceId(device_id))),
      None => {
        warn!("Missing or invalid X-Device-ID header.");
        ready(Err(AppError::Validation(format!(
          "A valid {} header is required",
          DEVICE_ID_HEADER
        ))))
      }
    }
  }
}
