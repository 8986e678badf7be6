// apps/storefront/src/pages/profile.rs

use crate::errors::AppError;
use crate::format::initials;
use crate::models::UserProfile;
use crate::pipelines::contexts::UpdateProfileCtxData;
use crate::services::profile::ensure_profile;
use crate::services::session::SessionUser;
use crate::state::AppState;
use serde::Serialize;
use storeflow::{ContextData, PipelineResult};
use tracing::instrument;

#[derive(Debug, Serialize)]
pub struct ProfileView {
  pub profile: UserProfile,
  pub email: String,
  pub initials: String,
}

pub struct ProfilePage {
  state: AppState,
  user: SessionUser,
  profile: UserProfile,
}

impl ProfilePage {
  /// Creates the profile if it does not exist yet.
  #[instrument(name = "ProfilePage::load", skip(state, access_token))]
  pub async fn load(state: &AppState, access_token: Option<&str>) -> Result<Self, AppError> {
    let user = state.gate.require_user(access_token).await?;
    let profile = ensure_profile(state.backend.rows.as_ref(), &user).await?;
    Ok(Self {
      state: state.clone(),
      user,
      profile,
    })
  }

  pub fn view(&self) -> ProfileView {
    let name = if self.profile.full_name.trim().is_empty() {
      self.user.default_display_name()
    } else {
      self.profile.full_name.clone()
    };
    ProfileView {
      profile: self.profile.clone(),
      email: self.profile.email.clone().unwrap_or_else(|| self.user.email.clone()),
      initials: initials(&name),
    }
  }

  /// Saves name, phone and address; each is required after trimming.
  pub async fn update(&mut self, full_name: &str, phone: &str, address: &str) -> Result<ProfileView, AppError> {
    let ctx_data = ContextData::new(UpdateProfileCtxData {
      app_state: self.state.clone(),
      user: self.user.clone(),
      full_name: full_name.to_string(),
      phone: phone.to_string(),
      address: address.to_string(),
      profile: None,
    });
    match self.state.flows.run(ctx_data.clone()).await? {
      PipelineResult::Completed => {
        if let Some(profile) = ctx_data.update(|d| d.profile.take()) {
          self.profile = profile;
        }
        Ok(self.view())
      }
      PipelineResult::Stopped => Err(AppError::Internal("Profile update was halted by an internal step".to_string())),
    }
  }
}
