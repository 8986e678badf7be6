// apps/storefront/src/services/auth_service.rs

//! Password hashing plus the input checks and error wording shared by the
//! sign-up and sign-in flows.

use crate::backend::BackendError;
use crate::errors::AppError;
use crate::format::validate_email;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use tracing::{debug, error, instrument};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Hashes a plain-text password with Argon2 and a random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| {
      error!(error = %e, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing failed: {}", e))
    })
}

/// `Ok(false)` on mismatch; errors only for a malformed stored hash.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  let parsed = PasswordHash::new(stored_hash)
    .map_err(|e| AppError::Internal(format!("Invalid stored password hash: {}", e)))?;
  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password mismatch.");
      Ok(false)
    }
    Err(e) => Err(AppError::Internal(format!("Password verification failed: {}", e))),
  }
}

/// Sign-up form fields, untrimmed.
#[derive(Debug, Clone)]
pub struct SignUpInput {
  pub full_name: String,
  pub email: String,
  pub password: String,
  pub confirm_password: String,
}

pub fn validate_sign_up(input: &SignUpInput) -> Result<(), AppError> {
  if input.full_name.trim().is_empty()
    || input.email.trim().is_empty()
    || input.password.is_empty()
    || input.confirm_password.is_empty()
  {
    return Err(AppError::Validation("All fields are required".to_string()));
  }
  if !validate_email(input.email.trim()) {
    return Err(AppError::Validation("Invalid email format".to_string()));
  }
  if input.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Password must be at least {} characters",
      MIN_PASSWORD_LEN
    )));
  }
  if input.password != input.confirm_password {
    return Err(AppError::Validation("Password confirmation does not match".to_string()));
  }
  Ok(())
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), AppError> {
  if email.trim().is_empty() || password.is_empty() {
    return Err(AppError::Validation("Email and password are required".to_string()));
  }
  Ok(())
}

/// Maps the identity provider's refusal to what the user is told.
pub fn sign_in_error(err: BackendError) -> AppError {
  match err {
    BackendError::Auth(ref m) if m == "Email not confirmed" || m.contains("email_not_confirmed") => {
      AppError::Validation("Email not verified yet. Check your inbox!".to_string())
    }
    BackendError::Auth(ref m) if m == "Invalid login credentials" => {
      AppError::Validation("Wrong email or password".to_string())
    }
    BackendError::Auth(m) => AppError::Validation(m),
    other => AppError::backend("Sign in")(other),
  }
}

pub fn sign_up_error(err: BackendError) -> AppError {
  match err {
    BackendError::Auth(ref m) if m.contains("User already registered") => {
      AppError::Validation("Email is already registered. Please sign in.".to_string())
    }
    BackendError::Auth(m) => AppError::Validation(m),
    other => AppError::backend("Sign up")(other),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(name: &str, email: &str, pw: &str, confirm: &str) -> SignUpInput {
    SignUpInput {
      full_name: name.to_string(),
      email: email.to_string(),
      password: pw.to_string(),
      confirm_password: confirm.to_string(),
    }
  }

  #[test]
  fn sign_up_checks_run_in_order() {
    let msg = |input: SignUpInput| validate_sign_up(&input).err().map(|e| e.to_string());
    assert_eq!(msg(form("", "a@b.co", "123456", "123456")).as_deref(), Some("All fields are required"));
    assert_eq!(msg(form("Budi", "a@b", "123456", "123456")).as_deref(), Some("Invalid email format"));
    assert_eq!(
      msg(form("Budi", "a@b.co", "12345", "12345")).as_deref(),
      Some("Password must be at least 6 characters")
    );
    assert_eq!(
      msg(form("Budi", "a@b.co", "123456", "1234567")).as_deref(),
      Some("Password confirmation does not match")
    );
    assert!(validate_sign_up(&form("Budi", "a@b.co", "123456", "123456")).is_ok());
  }

  #[test]
  fn provider_messages_become_friendly() {
    let err = sign_in_error(BackendError::Auth("Invalid login credentials".to_string()));
    assert_eq!(err.to_string(), "Wrong email or password");
    let err = sign_up_error(BackendError::Auth("User already registered".to_string()));
    assert_eq!(err.to_string(), "Email is already registered. Please sign in.");
    let err = sign_in_error(BackendError::Transport("timeout".to_string()));
    assert_eq!(err.to_string(), "Sign in failed: timeout");
  }

  #[test]
  fn hashes_verify() {
    let hash = hash_password("rahasia1").expect("hash");
    assert_eq!(verify_password(&hash, "rahasia1").ok(), Some(true));
    assert_eq!(verify_password(&hash, "rahasia2").ok(), Some(false));
    assert!(verify_password("not-a-hash", "x").is_err());
  }
}
