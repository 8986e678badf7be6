// apps/storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::pages::StorefrontPage;
use crate::services::catalog::ALL_CATEGORIES;
use crate::state::AppState;
use crate::web::extractors::{BearerToken, DeviceId};

#[derive(Deserialize, Debug)]
pub struct ListProductsQuery {
  pub category: Option<String>,
  pub q: Option<String>,
}

#[instrument(name = "handler::list_products", skip(app_state, token))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  device: DeviceId,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let mut page = StorefrontPage::open(&app_state, token.as_deref(), device.0).await;
  let category = query.category.as_deref().unwrap_or(ALL_CATEGORIES);
  let listing = page.products(category, query.q.as_deref().unwrap_or_default()).await;
  info!(count = listing.products.len(), fallback = listing.is_fallback, "Products listed.");
  Ok(HttpResponse::Ok().json(listing))
}
