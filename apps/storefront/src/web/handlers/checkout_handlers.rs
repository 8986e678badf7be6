// apps/storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::notice::Notice;
use crate::pages::CheckoutPage;
use crate::pipelines::contexts::CheckoutForm;
use crate::state::AppState;
use crate::web::extractors::{BearerToken, DeviceId};

#[derive(Deserialize, Debug)]
pub struct CheckoutQuery {
  pub delivery: Option<String>,
}

#[instrument(name = "handler::get_checkout", skip(app_state, token))]
pub async fn get_checkout_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  device: DeviceId,
  query: web::Query<CheckoutQuery>,
) -> Result<HttpResponse, AppError> {
  let page = CheckoutPage::enter(&app_state, token.as_deref(), device.0).await?;
  Ok(HttpResponse::Ok().json(page.view(query.delivery.as_deref()).await))
}

#[instrument(name = "handler::place_order", skip(app_state, token, form))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  device: DeviceId,
  form: web::Json<CheckoutForm>,
) -> Result<HttpResponse, AppError> {
  let placed = CheckoutPage::place_order(&app_state, token.as_deref(), device.0, form.into_inner()).await?;
  Ok(HttpResponse::Created().json(serde_json::json!({
    "order": placed.order,
    "next_page": placed.next_page,
    "notice": Notice::success("Order placed! Please complete the payment"),
  })))
}
