// apps/storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::notice::Notice;
use crate::pipelines::contexts::{SignInCtxData, SignUpCtxData};
use crate::services::auth_service::SignUpInput;
use crate::state::AppState;
use crate::web::extractors::BearerToken;
use storeflow::{ContextData, PipelineResult};

/// Page an admin lands on after signing in.
pub const ADMIN_PAGE: &str = "admin.html";

#[derive(Deserialize, Debug)]
pub struct SignupRequestPayload {
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub confirm_password: String,
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
}

#[instrument(
    name = "handler::signup",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(SignUpCtxData {
    app_state: app_state.get_ref().clone(),
    input: SignUpInput {
      full_name: payload.full_name,
      email: payload.email,
      password: payload.password,
      confirm_password: payload.confirm_password,
    },
    outcome: None,
    user: None,
  });

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let (outcome, user) = ctx_data.with(|d| (d.outcome.clone(), d.user.clone()));
      let needs_confirmation = outcome.as_ref().map_or(false, |o| o.needs_confirmation());
      let access_token = user.as_ref().map(|u| u.access_token.clone());
      info!(needs_confirmation, "Sign-up finished.");

      let notice = if needs_confirmation {
        Notice::success("Registration successful! Check your email to verify your account")
      } else {
        Notice::success("Registration successful!")
      };
      Ok(HttpResponse::Created().json(json!({
        "user": user,
        "access_token": access_token,
        "needs_confirmation": needs_confirmation,
        "notice": notice,
      })))
    }
    PipelineResult::Stopped => {
      warn!("Sign-up pipeline was stopped by a handler.");
      Err(AppError::Internal("Sign-up was halted by an internal step.".to_string()))
    }
  }
}

#[instrument(
    name = "handler::signin",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(SignInCtxData {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    user: None,
    profile: None,
  });

  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let user = ctx_data
        .with(|d| d.user.clone())
        .ok_or_else(|| AppError::Internal("Sign-in completed without a session.".to_string()))?;
      let next_page = if user.is_admin() { Some(ADMIN_PAGE) } else { None };
      Ok(HttpResponse::Ok().json(json!({
        "access_token": user.access_token.clone(),
        "user": user,
        "next_page": next_page,
        "notice": Notice::success("Signed in!"),
      })))
    }
    PipelineResult::Stopped => {
      warn!("Sign-in pipeline was stopped by a handler.");
      Err(AppError::Internal("Sign-in was halted by an internal step.".to_string()))
    }
  }
}

#[instrument(name = "handler::signout", skip(app_state, token))]
pub async fn signout_handler(app_state: web::Data<AppState>, token: BearerToken) -> Result<HttpResponse, AppError> {
  app_state.gate.sign_out(token.as_deref()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "notice": Notice::success("Signed out"),
  })))
}
