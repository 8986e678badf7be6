// apps/storefront/src/pipelines/signin_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::SignInCtxData;
use crate::services::auth_service;
use crate::services::profile::ensure_profile;
use crate::services::session::AuthEventKind;
use storeflow::{ContextData, Flows, Pipeline, PipelineControl};
use tracing::{event, warn, Level};

/// Registers the sign-in pipeline.
pub fn register_signin_pipeline(flows: &Flows<AppError>) {
  let mut signin_p = Pipeline::<SignInCtxData, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("authenticate", false, None),
    // Best effort; a sign-in never fails because the profile could not be made.
    ("ensure_profile", false, None),
    ("announce_signed_in", false, None),
  ]);

  signin_p.on("validate_signin_input", |ctx_data: ContextData<SignInCtxData>| {
    Box::pin(async move {
      let (email, password) = ctx_data.with(|d| (d.email.clone(), d.password.clone()));
      auth_service::validate_sign_in(&email, &password)?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  signin_p.on("authenticate", |ctx_data: ContextData<SignInCtxData>| {
    Box::pin(async move {
      let (state, email, password) = {
        let guard = ctx_data.read();
        (guard.app_state.clone(), guard.email.trim().to_string(), guard.password.clone())
      };
      event!(Level::DEBUG, email = %email, "Signing in.");
      let session = state.backend.identity.sign_in(&email, &password).await.map_err(|e| {
        warn!(error = %e, "Sign-in refused by the identity provider.");
        auth_service::sign_in_error(e)
      })?;
      let user = state.gate.resolve(session);
      event!(Level::INFO, user_id = %user.id, admin = user.is_admin(), "Signed in.");
      ctx_data.write().user = Some(user);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  signin_p.on("ensure_profile", |ctx_data: ContextData<SignInCtxData>| {
    Box::pin(async move {
      let (rows, user) = ctx_data.with(|d| (d.app_state.backend.rows.clone(), d.user.clone()));
      let Some(user) = user else {
        return Ok::<_, AppError>(PipelineControl::Continue);
      };
      match ensure_profile(rows.as_ref(), &user).await {
        Ok(profile) => ctx_data.write().profile = Some(profile),
        Err(e) => warn!(user_id = %user.id, error = %e, "Could not ensure a profile at sign-in."),
      }
      Ok(PipelineControl::Continue)
    })
  });

  signin_p.on("announce_signed_in", |ctx_data: ContextData<SignInCtxData>| {
    Box::pin(async move {
      let (gate, user_id) = ctx_data.with(|d| (d.app_state.gate.clone(), d.user.as_ref().map(|u| u.id.clone())));
      gate.events().publish(AuthEventKind::SignedIn, user_id);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register(signin_p);
  tracing::info!("Sign-in pipeline registered.");
}
