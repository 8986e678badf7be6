// apps/storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use sweetify_storefront::backend::Backend;
use sweetify_storefront::config::AppConfig;
use sweetify_storefront::persistence::{FileKv, KeyValueStore, MemoryKv};
use sweetify_storefront::services::session::AuthEventKind;
use sweetify_storefront::state::AppState;
use sweetify_storefront::web;
use tokio::sync::broadcast::error::RecvError;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting Sweetify storefront server...");

  let app_config = Arc::new(AppConfig::from_env().context("loading configuration")?);

  let backend = Backend::connect(&app_config).await.context("connecting the backend")?;

  let mirror_store: Arc<dyn KeyValueStore> = match &app_config.mirror_dir {
    Some(dir) => {
      tracing::info!(dir = %dir.display(), "Using the file-backed cart mirror.");
      Arc::new(FileKv::open(dir).context("opening the cart mirror directory")?)
    }
    None => Arc::new(MemoryKv::new()),
  };

  let app_state = AppState::new(backend, app_config.clone(), mirror_store);

  let mut auth_events = app_state.gate.events().subscribe();
  tokio::spawn(async move {
    loop {
      match auth_events.recv().await {
        Ok(event) => match event.kind {
          AuthEventKind::SignedIn => tracing::info!(user_id = ?event.user_id, "User signed in."),
          AuthEventKind::SignedOut => tracing::info!(user_id = ?event.user_id, "User signed out."),
        },
        Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Auth event log fell behind."),
        Err(RecvError::Closed) => break,
      }
    }
  });

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await?;
  Ok(())
}
