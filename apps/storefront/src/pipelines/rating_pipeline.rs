// apps/storefront/src/pipelines/rating_pipeline.rs

use crate::errors::AppError;
use crate::models::{OrderStatus, Rating};
use crate::pipelines::common_steps::load_owned_order;
use crate::pipelines::contexts::SubmitRatingsCtxData;
use storeflow::{ContextData, Flows, Pipeline, PipelineControl};
use tracing::{info, warn};

pub const MAX_STARS: u8 = 5;

pub fn register_rating_pipeline(flows: &Flows<AppError>) {
  let mut p = Pipeline::<SubmitRatingsCtxData, AppError>::new(&[
    ("collect_ratings", false, None),
    ("check_order_rateable", false, None),
    ("upsert_ratings", false, None),
  ]);

  // Entries without stars are dropped; if nothing is left, nothing is written.
  p.on("collect_ratings", |ctx_data: ContextData<SubmitRatingsCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      if guard.entries.iter().any(|e| e.rating > MAX_STARS) {
        return Err(AppError::Validation(format!("Ratings go from 1 to {} stars", MAX_STARS)));
      }
      let ratings: Vec<Rating> = guard
        .entries
        .iter()
        .filter(|e| e.rating >= 1)
        .map(|e| Rating {
          user_id: guard.user.id.clone(),
          order_id: guard.order_id.clone(),
          product_id: e.product_id.clone(),
          rating: i16::from(e.rating),
          review: e.review.as_deref().map(str::trim).filter(|r| !r.is_empty()).map(str::to_string),
        })
        .collect();
      if ratings.is_empty() {
        warn!("Rating submitted without any stars.");
        return Err(AppError::Validation("Please select at least one star".to_string()));
      }
      guard.ratings = ratings;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("check_order_rateable", |ctx_data: ContextData<SubmitRatingsCtxData>| {
    Box::pin(async move {
      let (rows, user, order_id, product_ids) = ctx_data.with(|d| {
        (
          d.app_state.backend.rows.clone(),
          d.user.clone(),
          d.order_id.clone(),
          d.ratings.iter().map(|r| r.product_id.clone()).collect::<Vec<_>>(),
        )
      });
      let order = load_owned_order(rows, &user, &order_id).await?;
      if order.status != OrderStatus::Completed {
        return Err(AppError::Validation("Only completed orders can be rated".to_string()));
      }
      if let Some(stray) = product_ids.iter().find(|id| !order.lines.iter().any(|l| &l.product_id == *id)) {
        warn!(product_id = %stray, %order_id, "Rating for a product that is not on the order.");
        return Err(AppError::Validation("Product is not part of this order".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("upsert_ratings", |ctx_data: ContextData<SubmitRatingsCtxData>| {
    Box::pin(async move {
      let (rows, ratings) = ctx_data.with(|d| (d.app_state.backend.rows.clone(), d.ratings.clone()));
      rows
        .upsert_ratings(&ratings)
        .await
        .map_err(AppError::backend("Submit rating"))?;
      info!(count = ratings.len(), "Ratings saved.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register(p);
  info!("Rating pipeline registered.");
}
