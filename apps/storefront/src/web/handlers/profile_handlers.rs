// apps/storefront/src/web/handlers/profile_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::notice::Notice;
use crate::pages::ProfilePage;
use crate::state::AppState;
use crate::web::extractors::BearerToken;

#[derive(Deserialize, Debug)]
pub struct UpdateProfilePayload {
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub address: String,
}

#[instrument(name = "handler::get_profile", skip(app_state, token))]
pub async fn get_profile_handler(app_state: web::Data<AppState>, token: BearerToken) -> Result<HttpResponse, AppError> {
  let page = ProfilePage::load(&app_state, token.as_deref()).await?;
  Ok(HttpResponse::Ok().json(page.view()))
}

#[instrument(name = "handler::update_profile", skip(app_state, token, payload))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  token: BearerToken,
  payload: web::Json<UpdateProfilePayload>,
) -> Result<HttpResponse, AppError> {
  let mut page = ProfilePage::load(&app_state, token.as_deref()).await?;
  let view = page.update(&payload.full_name, &payload.phone, &payload.address).await?;
  Ok(HttpResponse::Ok().json(json!({
    "profile": view,
    "notice": Notice::success("Profile updated"),
  })))
}
