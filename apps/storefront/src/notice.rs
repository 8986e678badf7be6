// apps/storefront/src/notice.rs

//! Transient user-facing notices (the toast banner on the front-end).

use serde::Serialize;

/// How long the front-end keeps a notice on screen.
pub const NOTICE_DISMISS_MS: u64 = 3000;

/// Delay before the front-end follows an identity redirect.
pub const REDIRECT_DELAY_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub message: String,
  pub severity: Severity,
  pub dismiss_after_ms: u64,
}

impl Notice {
  pub fn success(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      severity: Severity::Success,
      dismiss_after_ms: NOTICE_DISMISS_MS,
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      severity: Severity::Error,
      dismiss_after_ms: NOTICE_DISMISS_MS,
    }
  }

  pub fn is_error(&self) -> bool {
    self.severity == Severity::Error
  }
}
