// apps/storefront/src/services/session.rs

//! Session/identity gate: resolves bearer tokens into users with a
//! capability, and broadcasts sign-in / sign-out events.

use crate::backend::IdentityProvider;
use crate::errors::AppError;
use crate::models::{Capability, Session};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

/// A signed-in user as the workflows see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
  pub id: String,
  pub email: String,
  pub full_name: Option<String>,
  #[serde(skip)]
  pub access_token: String,
  pub capability: Capability,
}

impl SessionUser {
  pub fn is_admin(&self) -> bool {
    self.capability == Capability::Admin
  }

  /// Name for a new profile: sign-up metadata, else the email's local part.
  pub fn default_display_name(&self) -> String {
    match self.full_name.as_deref().map(str::trim) {
      Some(name) if !name.is_empty() => name.to_string(),
      _ => self.email.split('@').next().unwrap_or_default().to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
  SignedIn,
  SignedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthEvent {
  pub kind: AuthEventKind,
  pub user_id: Option<String>,
}

/// Fan-out of auth changes to whoever subscribed.
#[derive(Clone)]
pub struct AuthEvents {
  tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity);
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
    self.tx.subscribe()
  }

  pub fn publish(&self, kind: AuthEventKind, user_id: Option<String>) {
    // No receivers is not an error.
    let receivers = self.tx.send(AuthEvent { kind, user_id }).unwrap_or(0);
    debug!(?kind, receivers, "Auth event published.");
  }
}

impl Default for AuthEvents {
  fn default() -> Self {
    Self::new(64)
  }
}

#[derive(Clone)]
pub struct SessionGate {
  identity: Arc<dyn IdentityProvider>,
  admin_email: String,
  events: AuthEvents,
}

impl SessionGate {
  pub fn new(identity: Arc<dyn IdentityProvider>, admin_email: impl Into<String>, events: AuthEvents) -> Self {
    Self {
      identity,
      admin_email: admin_email.into(),
      events,
    }
  }

  pub fn events(&self) -> &AuthEvents {
    &self.events
  }

  pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
    &self.identity
  }

  /// Resolves the capability once, by exact email comparison.
  pub fn resolve(&self, session: Session) -> SessionUser {
    let capability = if session.user.email == self.admin_email {
      Capability::Admin
    } else {
      Capability::Customer
    };
    SessionUser {
      id: session.user.id,
      email: session.user.email,
      full_name: session.user.full_name,
      access_token: session.access_token,
      capability,
    }
  }

  /// Current user, or `None` for a missing, unknown or unverifiable token.
  #[instrument(name = "SessionGate::current_user", skip_all)]
  pub async fn current_user(&self, access_token: Option<&str>) -> Option<SessionUser> {
    let token = access_token.filter(|t| !t.is_empty())?;
    match self.identity.get_session(token).await {
      Ok(session) => session.map(|s| self.resolve(s)),
      Err(e) => {
        warn!(error = %e, "Session lookup failed; treating the request as signed out.");
        None
      }
    }
  }

  /// Ends the session at the provider and tells subscribers.
  #[instrument(name = "SessionGate::sign_out", skip_all)]
  pub async fn sign_out(&self, access_token: Option<&str>) -> Result<(), AppError> {
    let user_id = self.current_user(access_token).await.map(|u| u.id);
    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
      self
        .identity
        .sign_out(token)
        .await
        .map_err(AppError::backend("Sign out"))?;
    }
    self.events.publish(AuthEventKind::SignedOut, user_id);
    Ok(())
  }

  pub async fn require_user(&self, access_token: Option<&str>) -> Result<SessionUser, AppError> {
    self.current_user(access_token).await.ok_or_else(AppError::not_signed_in)
  }

  pub async fn require_admin(&self, access_token: Option<&str>) -> Result<SessionUser, AppError> {
    let user = self.require_user(access_token).await?;
    if !user.is_admin() {
      warn!(user_id = %user.id, "Non-admin user attempted an admin-only action.");
      return Err(AppError::admin_only());
    }
    Ok(user)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::memory::MemoryBackend;

  #[tokio::test]
  async fn admin_capability_is_exact_email_match() {
    let backend = Arc::new(MemoryBackend::new());
    let gate = SessionGate::new(backend.clone(), "owner@sweetify.id", AuthEvents::default());

    let owner = backend
      .sign_up("owner@sweetify.id", "rahasia1", "Owner")
      .await
      .expect("sign up")
      .session
      .expect("session");
    let shouty = backend
      .sign_up("OWNER@sweetify.id", "rahasia1", "Shouty")
      .await
      .expect("sign up")
      .session
      .expect("session");

    assert!(gate.require_admin(Some(&owner.access_token)).await.is_ok());
    assert!(matches!(
      gate.require_admin(Some(&shouty.access_token)).await,
      Err(AppError::Identity { .. })
    ));
    assert!(gate.require_user(None).await.is_err());
    assert!(gate.current_user(Some("bogus")).await.is_none());
  }

  #[test]
  fn display_name_falls_back_to_email_local_part() {
    let user = SessionUser {
      id: "u1".to_string(),
      email: "rina.w@sweetify.id".to_string(),
      full_name: None,
      access_token: String::new(),
      capability: Capability::Customer,
    };
    assert_eq!(user.default_display_name(), "rina.w");
  }
}
