// apps/storefront/src/pipelines/mod.rs

//! Every multi-step storefront workflow, as a `storeflow` pipeline.

use crate::errors::AppError;
use storeflow::Flows;

pub mod common_steps;
pub mod contexts;

pub mod checkout_pipeline;
pub mod payment_pipeline;
pub mod profile_pipeline;
pub mod rating_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;

/// Registers all workflow pipelines. Called once while building `AppState`.
pub fn register_all_pipelines(flows: &Flows<AppError>) {
  tracing::info!("Registering workflow pipelines...");

  signup_pipeline::register_signup_pipeline(flows);
  signin_pipeline::register_signin_pipeline(flows);
  checkout_pipeline::register_checkout_pipeline(flows);
  payment_pipeline::register_submit_proof_pipeline(flows);
  payment_pipeline::register_simulate_payment_pipeline(flows);
  rating_pipeline::register_rating_pipeline(flows);
  profile_pipeline::register_profile_pipeline(flows);

  tracing::info!("All workflow pipelines registered.");
}
