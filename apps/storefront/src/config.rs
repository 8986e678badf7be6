// apps/storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which collaborators back the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
  /// Hosted backend-as-a-service over REST for auth, rows and storage.
  Supabase,
  /// Rows straight from Postgres; auth and storage still over REST.
  Postgres,
  /// Everything in process. Used offline and by the tests.
  Memory,
}

impl FromStr for BackendMode {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "supabase" => Ok(BackendMode::Supabase),
      "postgres" => Ok(BackendMode::Postgres),
      "memory" => Ok(BackendMode::Memory),
      other => Err(AppError::Config(format!("Unknown BACKEND_MODE '{}'", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub backend_mode: BackendMode,

  pub supabase_url: Option<String>,
  pub supabase_anon_key: Option<String>,
  pub database_url: Option<String>,
  pub storage_bucket: String,
  pub http_timeout_secs: u64,

  /// Session email that grants the admin capability. Compared case-sensitively.
  pub admin_email: String,
  /// Flat fee charged for courier delivery.
  pub delivery_fee: i64,
  /// Directory for the file-backed local mirror; in-memory when unset.
  pub mirror_dir: Option<PathBuf>,
  pub qr_base_url: String,
  pub whatsapp_number: String,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      backend_mode: BackendMode::Memory,
      supabase_url: None,
      supabase_anon_key: None,
      database_url: None,
      storage_bucket: "uploads".to_string(),
      http_timeout_secs: 30,
      admin_email: "admin@sweetify.id".to_string(),
      delivery_fee: 15000,
      mirror_dir: None,
      qr_base_url: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
      whatsapp_number: "628561311299".to_string(),
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let defaults = AppConfig::default();

    let server_host = get_env("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| defaults.server_port.to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let backend_mode = get_env("BACKEND_MODE")
      .unwrap_or_else(|_| "supabase".to_string())
      .parse::<BackendMode>()?;

    let supabase_url = get_env("SUPABASE_URL").ok().map(|u| u.trim_end_matches('/').to_string());
    let supabase_anon_key = get_env("SUPABASE_ANON_KEY").ok();
    let database_url = get_env("DATABASE_URL").ok();

    let delivery_fee = get_env("DELIVERY_FEE")
      .unwrap_or_else(|_| defaults.delivery_fee.to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid DELIVERY_FEE: {}", e)))?;
    let http_timeout_secs = get_env("HTTP_TIMEOUT_SECS")
      .unwrap_or_else(|_| defaults.http_timeout_secs.to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid HTTP_TIMEOUT_SECS: {}", e)))?;

    let config = Self {
      server_host,
      server_port,
      backend_mode,
      supabase_url,
      supabase_anon_key,
      database_url,
      storage_bucket: get_env("STORAGE_BUCKET").unwrap_or(defaults.storage_bucket),
      http_timeout_secs,
      admin_email: get_env("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
      delivery_fee,
      mirror_dir: get_env("MIRROR_DIR").ok().map(PathBuf::from),
      qr_base_url: get_env("QR_BASE_URL").unwrap_or(defaults.qr_base_url),
      whatsapp_number: get_env("WHATSAPP_NUMBER").unwrap_or(defaults.whatsapp_number),
    };
    config.check()?;

    tracing::info!(backend = ?config.backend_mode, "Application configuration loaded successfully.");
    Ok(config)
  }

  /// Verifies the settings the selected backend mode depends on are present.
  pub fn check(&self) -> Result<()> {
    let needs_rest = matches!(self.backend_mode, BackendMode::Supabase | BackendMode::Postgres);
    if needs_rest && (self.supabase_url.is_none() || self.supabase_anon_key.is_none()) {
      return Err(AppError::Config(
        "SUPABASE_URL and SUPABASE_ANON_KEY are required for this backend mode".to_string(),
      ));
    }
    if self.backend_mode == BackendMode::Postgres && self.database_url.is_none() {
      return Err(AppError::Config("DATABASE_URL is required when BACKEND_MODE=postgres".to_string()));
    }
    if self.delivery_fee < 0 {
      return Err(AppError::Config("DELIVERY_FEE cannot be negative".to_string()));
    }
    Ok(())
  }
}
