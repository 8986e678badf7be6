// apps/storefront/src/pipelines/signup_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::SignUpCtxData;
use crate::services::auth_service;
use crate::services::profile::ensure_profile;
use crate::services::session::AuthEventKind;
use std::sync::Arc;
use storeflow::{ContextData, Flows, Pipeline, PipelineControl, SkipCondition};
use tracing::{event, info, warn, Level};

/// Registers the sign-up pipeline.
///
/// When the provider requires email confirmation no session comes back, and
/// the profile and sign-in steps are skipped.
pub fn register_signup_pipeline(flows: &Flows<AppError>) {
  let no_session: SkipCondition<SignUpCtxData> = Arc::new(|d: &SignUpCtxData| d.user.is_none());

  let mut signup_p = Pipeline::<SignUpCtxData, AppError>::new(&[
    ("validate_signup_input", false, None),
    ("register_account", false, None),
    ("ensure_profile", false, Some(no_session.clone())),
    ("announce_signed_in", false, Some(no_session)),
  ]);

  signup_p.on("validate_signup_input", |ctx_data: ContextData<SignUpCtxData>| {
    Box::pin(async move {
      let input = ctx_data.read().input.clone();
      event!(Level::DEBUG, email = %input.email.trim(), "Validating sign-up input.");
      auth_service::validate_sign_up(&input)?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  signup_p.on("register_account", |ctx_data: ContextData<SignUpCtxData>| {
    Box::pin(async move {
      let (state, input) = {
        let guard = ctx_data.read();
        (guard.app_state.clone(), guard.input.clone())
      };
      let outcome = state
        .backend
        .identity
        .sign_up(input.email.trim(), &input.password, input.full_name.trim())
        .await
        .map_err(|e| {
          warn!(error = %e, "Sign-up refused by the identity provider.");
          auth_service::sign_up_error(e)
        })?;

      let user = outcome.session.clone().map(|s| state.gate.resolve(s));
      info!(
        needs_confirmation = outcome.needs_confirmation(),
        signed_in = user.is_some(),
        "Account registered."
      );
      {
        let mut guard = ctx_data.write();
        guard.outcome = Some(outcome);
        guard.user = user;
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  signup_p.on("ensure_profile", |ctx_data: ContextData<SignUpCtxData>| {
    Box::pin(async move {
      let (rows, user) = {
        let guard = ctx_data.read();
        (guard.app_state.backend.rows.clone(), guard.user.clone())
      };
      if let Some(user) = user {
        ensure_profile(rows.as_ref(), &user).await?;
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  signup_p.on("announce_signed_in", |ctx_data: ContextData<SignUpCtxData>| {
    Box::pin(async move {
      let (gate, user_id) = ctx_data.with(|d| (d.app_state.gate.clone(), d.user.as_ref().map(|u| u.id.clone())));
      gate.events().publish(AuthEventKind::SignedIn, user_id);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register(signup_p);
  tracing::info!("Sign-up pipeline registered.");
}
