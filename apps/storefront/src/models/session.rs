// apps/storefront/src/models/session.rs

use serde::{Deserialize, Serialize};

/// The identity provider's view of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id: String,
  pub email: String,
  /// `full_name` from the sign-up metadata, when given.
  #[serde(default)]
  pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub access_token: String,
  pub user: AuthUser,
}

/// What a sign-up returned. No session means the address must be confirmed
/// before the first sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
  pub user: Option<AuthUser>,
  pub session: Option<Session>,
}

impl SignUpOutcome {
  pub fn needs_confirmation(&self) -> bool {
    self.user.is_some() && self.session.is_none()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
  Customer,
  Admin,
}
