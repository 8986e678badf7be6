// apps/storefront/src/models/profile.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
  pub id: String,
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub email: Option<String>,
}
