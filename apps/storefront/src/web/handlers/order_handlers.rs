// apps/storefront/src/web/handlers/order_handlers.rs

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::notice::Notice;
use crate::pages::payment::ORDERS_PAGE;
use crate::pages::{OrderTab, OrdersPage, PaymentPage};
use crate::pipelines::contexts::{ProofFile, RatingEntry};
use crate::state::AppState;
use crate::web::extractors::BearerToken;

pub const FILE_NAME_HEADER: &str = "X-File-Name";

#[derive(Deserialize, Debug)]
pub struct OrdersQuery {
  pub tab: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RatingsPayload {
  pub ratings: Vec<RatingEntry>,
}

#[instrument(name = "handler::list_orders", skip(app_state, token))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  query: web::Query<OrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let tab: OrderTab = query.tab.as_deref().unwrap_or_default().parse()?;
  let page = OrdersPage::load_orders(&app_state, token.as_deref()).await?;
  Ok(HttpResponse::Ok().json(page.view(tab)))
}

#[instrument(name = "handler::get_payment", skip(app_state, token, path), fields(order_id = %path.as_ref()))]
pub async fn get_payment_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let page = PaymentPage::load_order(&app_state, token.as_deref(), &path).await?;
  let instruction = page.instruction()?;
  let contact_link = crate::pages::orders::admin_contact_link(
    &app_state.config.whatsapp_number,
    &instruction.order.order_number,
  )?;
  Ok(HttpResponse::Ok().json(json!({
    "payment": instruction,
    "admin_contact_link": contact_link,
  })))
}

/// Raw image body; the type comes from `Content-Type`, the name from
/// `X-File-Name`.
#[instrument(name = "handler::submit_payment_proof", skip(app_state, token, req, path, body), fields(order_id = %path.as_ref(), size = body.len()))]
pub async fn submit_proof_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  req: HttpRequest,
  path: web::Path<String>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let header = |name: &str| {
    req
      .headers()
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string)
      .unwrap_or_default()
  };
  let file = ProofFile {
    content_type: header(CONTENT_TYPE.as_str()),
    file_name: header(FILE_NAME_HEADER),
    bytes: body.to_vec(),
  };

  let mut page = PaymentPage::load_order(&app_state, token.as_deref(), &path).await?;
  let order = page.submit_proof(file).await?;
  info!(status = %order.status, "Payment proof accepted.");
  Ok(HttpResponse::Ok().json(json!({
    "order": order,
    "next_page": ORDERS_PAGE,
    "notice": Notice::success("Payment proof sent!"),
  })))
}

#[instrument(name = "handler::simulate_payment", skip(app_state, token, path), fields(order_id = %path.as_ref()))]
pub async fn simulate_payment_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let mut page = PaymentPage::load_order(&app_state, token.as_deref(), &path).await?;
  let order = page.simulate_success().await?;
  Ok(HttpResponse::Ok().json(json!({
    "order": order,
    "next_page": ORDERS_PAGE,
    "notice": Notice::success("Payment received! Your order is being processed"),
  })))
}

#[instrument(name = "handler::get_ratings", skip(app_state, token, path), fields(order_id = %path.as_ref()))]
pub async fn get_ratings_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let page = OrdersPage::load_orders(&app_state, token.as_deref()).await?;
  Ok(HttpResponse::Ok().json(page.rating_form(&path).await?))
}

#[instrument(name = "handler::submit_ratings", skip(app_state, token, path, payload), fields(order_id = %path.as_ref()))]
pub async fn submit_ratings_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  path: web::Path<String>,
  payload: web::Json<RatingsPayload>,
) -> Result<HttpResponse, AppError> {
  let page = OrdersPage::load_orders(&app_state, token.as_deref()).await?;
  let ratings = page.submit_ratings(&path, payload.into_inner().ratings).await?;
  Ok(HttpResponse::Ok().json(json!({
    "ratings": ratings,
    "notice": Notice::success("Thank you for your rating!"),
  })))
}
