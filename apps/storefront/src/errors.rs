// apps/storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::notice::{Notice, REDIRECT_DELAY_MS};
use storeflow::FlowError;

/// Page the front-end is sent to when an identity check fails.
pub const SAFE_PAGE: &str = "index.html";

#[derive(Debug, Error)]
pub enum AppError {
  /// Bad input. Reported immediately; nothing was changed.
  #[error("{0}")]
  Validation(String),

  /// Not signed in, or signed in without the needed capability.
  #[error("{message}")]
  Identity { message: String, redirect_to: String },

  /// The page has nothing to show in the current state.
  #[error("{message}")]
  Redirect { message: String, redirect_to: String },

  /// A remote collaborator failed.
  #[error("{operation} failed: {source}")]
  Backend {
    operation: String,
    #[source]
    source: BackendError,
  },

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn not_signed_in() -> Self {
    AppError::Identity {
      message: "Please sign in first".to_string(),
      redirect_to: SAFE_PAGE.to_string(),
    }
  }

  pub fn admin_only() -> Self {
    AppError::Identity {
      message: "Access denied. Only the admin can open this page.".to_string(),
      redirect_to: SAFE_PAGE.to_string(),
    }
  }

  pub fn redirect(message: impl Into<String>, redirect_to: impl Into<String>) -> Self {
    AppError::Redirect {
      message: message.into(),
      redirect_to: redirect_to.into(),
    }
  }

  /// Adapter for `map_err` that tags a backend failure with the operation
  /// it interrupted.
  pub fn backend(operation: &'static str) -> impl FnOnce(BackendError) -> AppError {
    move |source| {
      tracing::error!(operation, error = %source, "Backend request failed.");
      AppError::Backend {
        operation: operation.to_string(),
        source,
      }
    }
  }

  /// The notice the front-end shows for this error.
  pub fn notice(&self) -> Notice {
    match self {
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        Notice::error("Something went wrong. Please try again.")
      }
      other => Notice::error(other.to_string()),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<BackendError>() {
      Ok(source) => AppError::Backend {
        operation: "Request".to_string(),
        source,
      },
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Identity { .. } => StatusCode::UNAUTHORIZED,
      AppError::Redirect { .. } => StatusCode::CONFLICT,
      AppError::Backend { .. } => StatusCode::BAD_GATEWAY,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    match self {
      AppError::Validation(_) | AppError::Redirect { .. } | AppError::NotFound(_) | AppError::Conflict(_) => {
        tracing::warn!(application_error = %self, "Responding with error");
      }
      _ => tracing::error!(application_error = %self, "Responding with error"),
    }

    let mut body = json!({
      "error": self.to_string(),
      "notice": self.notice(),
    });
    if let AppError::Identity { redirect_to, .. } | AppError::Redirect { redirect_to, .. } = self {
      body["redirect"] = json!({ "to": redirect_to, "after_ms": REDIRECT_DELAY_MS });
    }
    if let AppError::Workflow { source } = self {
      tracing::error!(workflow_error_source = ?source, "Workflow error details");
    }
    HttpResponse::build(self.status_code()).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn backend_errors_name_the_operation() {
    let err = AppError::backend("Create order")(BackendError::Unavailable("connection reset".to_string()));
    assert_eq!(err.to_string(), "Create order failed: connection reset");
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
  }

  #[test]
  fn internal_errors_do_not_leak_into_notices() {
    let err = AppError::Internal("lock poisoned at line 12".to_string());
    assert_eq!(err.notice().message, "Something went wrong. Please try again.");
  }

  #[test]
  fn identity_errors_carry_a_redirect() {
    let err = AppError::not_signed_in();
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    match err {
      AppError::Identity { redirect_to, .. } => assert_eq!(redirect_to, SAFE_PAGE),
      other => panic!("unexpected {:?}", other),
    }
  }
}
