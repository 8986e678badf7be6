// apps/storefront/src/pipelines/common_steps.rs

//! Reusable pieces shared by several pipelines.

use crate::backend::RowStore;
use crate::errors::AppError;
use crate::models::Order;
use crate::services::session::SessionUser;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Loads an order with its lines, visible only to the customer who placed it.
///
/// Someone else's order reads as not found.
#[instrument(name = "step::load_owned_order", skip(rows, user), fields(user_id = %user.id))]
pub async fn load_owned_order(rows: Arc<dyn RowStore>, user: &SessionUser, order_id: &str) -> Result<Order, AppError> {
  let order = rows
    .find_order(order_id)
    .await
    .map_err(AppError::backend("Load order"))?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  if order.user_id != user.id {
    warn!(owner = %order.user_id, "Order requested by a different user.");
    return Err(AppError::NotFound("Order not found".to_string()));
  }
  Ok(order)
}
