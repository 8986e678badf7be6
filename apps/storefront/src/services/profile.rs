// apps/storefront/src/services/profile.rs

//! Lazily created user profiles and their contact fields.

use crate::backend::RowStore;
use crate::errors::AppError;
use crate::models::UserProfile;
use crate::services::session::SessionUser;
use tracing::{info, instrument};

/// Returns the user's profile, creating it on first access.
///
/// A new profile takes its name from the sign-up metadata, falling back to
/// the email's local part; phone and address start empty.
#[instrument(name = "profile::ensure", skip_all, fields(user_id = %user.id))]
pub async fn ensure_profile(rows: &dyn RowStore, user: &SessionUser) -> Result<UserProfile, AppError> {
  if let Some(profile) = rows
    .find_profile(&user.id)
    .await
    .map_err(AppError::backend("Load profile"))?
  {
    return Ok(profile);
  }

  let profile = UserProfile {
    id: user.id.clone(),
    full_name: user.default_display_name(),
    phone: String::new(),
    address: String::new(),
    email: Some(user.email.clone()),
  };
  rows
    .insert_profile(&profile)
    .await
    .map_err(AppError::backend("Create profile"))?;
  info!("Created profile on first access.");
  Ok(profile)
}

/// Name, phone and address, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
  pub full_name: String,
  pub phone: String,
  pub address: String,
}

impl ContactDetails {
  /// Trims each field; all three are required.
  pub fn parse(full_name: &str, phone: &str, address: &str) -> Result<Self, AppError> {
    let details = Self {
      full_name: full_name.trim().to_string(),
      phone: phone.trim().to_string(),
      address: address.trim().to_string(),
    };
    if details.full_name.is_empty() || details.phone.is_empty() || details.address.is_empty() {
      return Err(AppError::Validation("Please complete all fields".to_string()));
    }
    Ok(details)
  }

  /// The `name\nphone\naddress` block stored on an order.
  pub fn delivery_block(&self) -> String {
    format!("{}\n{}\n{}", self.full_name, self.phone, self.address)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn contact_fields_are_trimmed_and_required() {
    let details = ContactDetails::parse("  Sari ", "0812 ", " Jl. Kenanga 3").unwrap();
    assert_eq!(details.delivery_block(), "Sari\n0812\nJl. Kenanga 3");
    assert!(ContactDetails::parse("Sari", "   ", "Jl. Kenanga 3").is_err());
  }
}
