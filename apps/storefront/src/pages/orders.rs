// apps/storefront/src/pages/orders.rs

use crate::errors::AppError;
use crate::format::format_currency;
use crate::models::{Order, OrderStatus, Rating};
use crate::pipelines::common_steps::load_owned_order;
use crate::pipelines::contexts::{RatingEntry, SubmitRatingsCtxData};
use crate::services::session::SessionUser;
use crate::state::AppState;
use reqwest::Url;
use serde::Serialize;
use std::str::FromStr;
use storeflow::{ContextData, PipelineResult};
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTab {
  All,
  /// Awaiting payment or awaiting confirmation.
  Pending,
  Processing,
  Shipping,
  Completed,
}

impl OrderTab {
  pub fn includes(self, status: OrderStatus) -> bool {
    match self {
      OrderTab::All => true,
      OrderTab::Pending => matches!(status, OrderStatus::Pending | OrderStatus::WaitingConfirmation),
      OrderTab::Processing => status == OrderStatus::Processing,
      OrderTab::Shipping => status == OrderStatus::Shipping,
      OrderTab::Completed => status == OrderStatus::Completed,
    }
  }
}

impl FromStr for OrderTab {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "" | "all" => Ok(OrderTab::All),
      "pending" => Ok(OrderTab::Pending),
      "processing" => Ok(OrderTab::Processing),
      "shipping" => Ok(OrderTab::Shipping),
      "completed" => Ok(OrderTab::Completed),
      other => Err(AppError::Validation(format!("Unknown order tab '{}'", other))),
    }
  }
}

/// One order as listed on the history page.
#[derive(Debug, Serialize)]
pub struct OrderSummary {
  #[serde(flatten)]
  pub order: Order,
  pub status_label: &'static str,
  pub total_display: String,
  pub can_rate: bool,
  pub can_pay: bool,
}

impl From<Order> for OrderSummary {
  fn from(order: Order) -> Self {
    Self {
      status_label: order.status.label(),
      total_display: format_currency(order.total_amount),
      can_rate: order.status == OrderStatus::Completed,
      can_pay: order.status == OrderStatus::Pending,
      order,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct OrdersView {
  pub tab: OrderTab,
  pub orders: Vec<OrderSummary>,
}

/// One product of an order on the rating form.
#[derive(Debug, Serialize)]
pub struct RatingFormLine {
  pub product_id: String,
  pub product_name: String,
  /// Present when the customer already rated this product on this order.
  pub existing: Option<Rating>,
}

#[derive(Debug, Serialize)]
pub struct RatingForm {
  pub order_id: String,
  pub order_number: String,
  pub lines: Vec<RatingFormLine>,
}

/// WhatsApp link that opens a chat with the shop about one order.
pub fn admin_contact_link(whatsapp_number: &str, order_number: &str) -> Result<String, AppError> {
  let text = format!(
    "Hello Sweetify Admin, I'd like to ask about my order:\n\nOrder No.: {}",
    order_number
  );
  Url::parse_with_params(&format!("https://wa.me/{}", whatsapp_number), &[("text", text.as_str())])
    .map(String::from)
    .map_err(|e| AppError::Config(format!("WHATSAPP_NUMBER does not form a valid link: {}", e)))
}

pub struct OrdersPage {
  state: AppState,
  user: SessionUser,
  orders: Vec<Order>,
}

impl OrdersPage {
  /// The signed-in user's orders with their lines, newest first.
  #[instrument(name = "OrdersPage::load_orders", skip(state, access_token))]
  pub async fn load_orders(state: &AppState, access_token: Option<&str>) -> Result<Self, AppError> {
    let user = state.gate.require_user(access_token).await?;
    let mut orders = state
      .backend
      .rows
      .orders_for_user(&user.id)
      .await
      .map_err(AppError::backend("Load orders"))?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    info!(count = orders.len(), "Orders loaded.");
    Ok(Self {
      state: state.clone(),
      user,
      orders,
    })
  }

  pub fn orders(&self) -> &[Order] {
    &self.orders
  }

  pub fn view(&self, tab: OrderTab) -> OrdersView {
    OrdersView {
      tab,
      orders: self
        .orders
        .iter()
        .filter(|o| tab.includes(o.status))
        .cloned()
        .map(OrderSummary::from)
        .collect(),
    }
  }

  /// Order lines with any ratings already given, so rated products show as such.
  pub async fn rating_form(&self, order_id: &str) -> Result<RatingForm, AppError> {
    let order = load_owned_order(self.state.backend.rows.clone(), &self.user, order_id).await?;
    let existing = self
      .state
      .backend
      .rows
      .ratings_for_order(&self.user.id, &order.id)
      .await
      .map_err(AppError::backend("Load ratings"))?;
    let lines = order
      .lines
      .iter()
      .map(|line| RatingFormLine {
        product_id: line.product_id.clone(),
        product_name: line.product_name.clone(),
        existing: existing.iter().find(|r| r.product_id == line.product_id).cloned(),
      })
      .collect();
    Ok(RatingForm {
      order_id: order.id,
      order_number: order.order_number,
      lines,
    })
  }

  /// Upserts one rating per starred product. With no stars at all nothing
  /// is written.
  pub async fn submit_ratings(&self, order_id: &str, entries: Vec<RatingEntry>) -> Result<Vec<Rating>, AppError> {
    let ctx_data = ContextData::new(SubmitRatingsCtxData {
      app_state: self.state.clone(),
      user: self.user.clone(),
      order_id: order_id.to_string(),
      entries,
      ratings: Vec::new(),
    });
    match self.state.flows.run(ctx_data.clone()).await? {
      PipelineResult::Completed => Ok(ctx_data.update(|d| std::mem::take(&mut d.ratings))),
      PipelineResult::Stopped => Err(AppError::Internal("Rating was halted by an internal step".to_string())),
    }
  }

  pub fn admin_contact_link(&self, order_number: &str) -> Result<String, AppError> {
    admin_contact_link(&self.state.config.whatsapp_number, order_number)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pending_tab_covers_both_unpaid_states() {
    assert!(OrderTab::Pending.includes(OrderStatus::Pending));
    assert!(OrderTab::Pending.includes(OrderStatus::WaitingConfirmation));
    assert!(!OrderTab::Pending.includes(OrderStatus::Processing));
    assert!(OrderTab::All.includes(OrderStatus::Cancelled));
    assert!("refunded".parse::<OrderTab>().is_err());
  }

  #[test]
  fn contact_link_encodes_the_message() {
    let link = admin_contact_link("628561311299", "SW202406010042").unwrap();
    assert!(link.starts_with("https://wa.me/628561311299?text=Hello+Sweetify+Admin"));
    assert!(link.ends_with("Order+No.%3A+SW202406010042"));
    assert!(link.contains("%0A%0A"));
  }
}
