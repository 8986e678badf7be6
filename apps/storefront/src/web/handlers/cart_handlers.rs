// apps/storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::pages::StorefrontPage;
use crate::state::AppState;
use crate::web::extractors::{BearerToken, DeviceId};

#[derive(Deserialize, Debug)]
pub struct AddItemPayload {
  pub product_id: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityPayload {
  pub delta: i64,
}

#[instrument(name = "handler::get_cart", skip(app_state))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, device: DeviceId) -> Result<HttpResponse, AppError> {
  let mut page = StorefrontPage::open(&app_state, None, device.0).await;
  Ok(HttpResponse::Ok().json(page.cart_view()))
}

#[instrument(name = "handler::add_cart_item", skip(app_state, payload), fields(product_id = %payload.product_id))]
pub async fn add_item_handler(
  app_state: web::Data<AppState>,
  device: DeviceId,
  payload: web::Json<AddItemPayload>,
) -> Result<HttpResponse, AppError> {
  let mut page = StorefrontPage::open(&app_state, None, device.0).await;
  let view = page.add_to_cart(&payload.product_id).await;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::update_cart_item", skip(app_state, path, payload), fields(product_id = %path.as_ref()))]
pub async fn update_item_handler(
  app_state: web::Data<AppState>,
  device: DeviceId,
  path: web::Path<String>,
  payload: web::Json<UpdateQuantityPayload>,
) -> Result<HttpResponse, AppError> {
  let mut page = StorefrontPage::open(&app_state, None, device.0).await;
  Ok(HttpResponse::Ok().json(page.update_quantity(&path, payload.delta)))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn remove_item_handler(
  app_state: web::Data<AppState>,
  device: DeviceId,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let mut page = StorefrontPage::open(&app_state, None, device.0).await;
  Ok(HttpResponse::Ok().json(page.remove_from_cart(&path)))
}

#[instrument(name = "handler::clear_cart", skip(app_state))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, device: DeviceId) -> Result<HttpResponse, AppError> {
  let mut page = StorefrontPage::open(&app_state, None, device.0).await;
  Ok(HttpResponse::Ok().json(page.clear_cart()))
}

#[instrument(name = "handler::proceed_to_checkout", skip(app_state, token))]
pub async fn proceed_to_checkout_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  device: DeviceId,
) -> Result<HttpResponse, AppError> {
  let page = StorefrontPage::open(&app_state, token.as_deref(), device.0).await;
  let next_page = page.proceed_to_checkout()?;
  info!("Cart handed to checkout.");
  Ok(HttpResponse::Ok().json(json!({ "next_page": next_page })))
}
