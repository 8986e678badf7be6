// apps/storefront/src/pipelines/profile_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::UpdateProfileCtxData;
use crate::services::profile::{ensure_profile, ContactDetails};
use storeflow::{ContextData, Flows, Pipeline, PipelineControl};
use tracing::info;

pub fn register_profile_pipeline(flows: &Flows<AppError>) {
  let mut p = Pipeline::<UpdateProfileCtxData, AppError>::new(&[
    ("validate_contact", false, None),
    ("ensure_profile", false, None),
    ("save_contact", false, None),
    ("reload_profile", false, None),
  ]);

  p.on("validate_contact", |ctx_data: ContextData<UpdateProfileCtxData>| {
    Box::pin(async move {
      ctx_data.with(|d| ContactDetails::parse(&d.full_name, &d.phone, &d.address))?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("ensure_profile", |ctx_data: ContextData<UpdateProfileCtxData>| {
    Box::pin(async move {
      let (rows, user) = ctx_data.with(|d| (d.app_state.backend.rows.clone(), d.user.clone()));
      ensure_profile(rows.as_ref(), &user).await?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("save_contact", |ctx_data: ContextData<UpdateProfileCtxData>| {
    Box::pin(async move {
      let (rows, user_id, contact) = ctx_data.with(|d| {
        (
          d.app_state.backend.rows.clone(),
          d.user.id.clone(),
          ContactDetails::parse(&d.full_name, &d.phone, &d.address),
        )
      });
      let contact = contact?;
      rows
        .update_profile_contact(&user_id, &contact.full_name, &contact.phone, &contact.address)
        .await
        .map_err(AppError::backend("Update profile"))?;
      info!(%user_id, "Profile contact updated.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("reload_profile", |ctx_data: ContextData<UpdateProfileCtxData>| {
    Box::pin(async move {
      let (rows, user_id) = ctx_data.with(|d| (d.app_state.backend.rows.clone(), d.user.id.clone()));
      let profile = rows
        .find_profile(&user_id)
        .await
        .map_err(AppError::backend("Load profile"))?;
      ctx_data.write().profile = profile;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register(p);
  info!("Profile pipeline registered.");
}
