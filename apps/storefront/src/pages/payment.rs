// apps/storefront/src/pages/payment.rs

use crate::errors::{AppError, SAFE_PAGE};
use crate::format::format_currency;
use crate::models::Order;
use crate::pipelines::common_steps::load_owned_order;
use crate::pipelines::contexts::{ProofFile, SimulatePaymentCtxData, SubmitProofCtxData};
use crate::services::session::SessionUser;
use crate::state::AppState;
use reqwest::Url;
use serde::Serialize;
use storeflow::{ContextData, PipelineResult};
use tracing::{info, instrument};

/// Page the front-end moves to once payment is settled.
pub const ORDERS_PAGE: &str = "orders.html";

/// What the customer needs to pay an order by QR.
#[derive(Debug, Serialize)]
pub struct PaymentInstruction {
  pub order: Order,
  pub total_display: String,
  pub qr_data: String,
  pub qr_image_url: String,
  pub accepts_proof: bool,
}

/// `QRIS_SWEETIFY_<order number>_<total>`
pub fn qr_payload(order: &Order) -> String {
  format!("QRIS_SWEETIFY_{}_{}", order.order_number, order.total_amount)
}

/// QR image request for `data`, percent-encoded into the generator's query.
pub fn qr_image_url(base_url: &str, data: &str) -> Result<String, AppError> {
  Url::parse_with_params(base_url, &[("size", "250x250"), ("data", data)])
    .map(String::from)
    .map_err(|e| AppError::Config(format!("QR_BASE_URL is not a valid URL: {}", e)))
}

pub struct PaymentPage {
  state: AppState,
  user: SessionUser,
  order: Order,
}

impl PaymentPage {
  /// Loads one of the signed-in user's orders with its lines.
  #[instrument(name = "PaymentPage::load_order", skip(state, access_token))]
  pub async fn load_order(state: &AppState, access_token: Option<&str>, order_id: &str) -> Result<Self, AppError> {
    let user = state.gate.require_user(access_token).await?;
    if order_id.trim().is_empty() {
      return Err(AppError::redirect("Order not found", SAFE_PAGE));
    }
    let order = load_owned_order(state.backend.rows.clone(), &user, order_id).await?;
    Ok(Self {
      state: state.clone(),
      user,
      order,
    })
  }

  pub fn order(&self) -> &Order {
    &self.order
  }

  pub fn instruction(&self) -> Result<PaymentInstruction, AppError> {
    let qr_data = qr_payload(&self.order);
    Ok(PaymentInstruction {
      qr_image_url: qr_image_url(&self.state.config.qr_base_url, &qr_data)?,
      qr_data,
      total_display: format_currency(self.order.total_amount),
      accepts_proof: self.order.status.accepts_payment_proof(),
      order: self.order.clone(),
    })
  }

  /// Uploads a proof image and moves the order to `waiting_confirmation`.
  /// On failure the order is left as it was.
  pub async fn submit_proof(&mut self, file: ProofFile) -> Result<&Order, AppError> {
    let ctx_data = ContextData::new(SubmitProofCtxData {
      app_state: self.state.clone(),
      user: self.user.clone(),
      order_id: self.order.id.clone(),
      file,
      order: None,
      proof_path: None,
      proof_url: None,
    });
    self.finish(ctx_data, |d: &mut SubmitProofCtxData| d.order.take()).await
  }

  /// Demo-only: marks the order paid without a proof.
  pub async fn simulate_success(&mut self) -> Result<&Order, AppError> {
    let ctx_data = ContextData::new(SimulatePaymentCtxData {
      app_state: self.state.clone(),
      user: self.user.clone(),
      order_id: self.order.id.clone(),
      order: None,
    });
    self.finish(ctx_data, |d: &mut SimulatePaymentCtxData| d.order.take()).await
  }

  async fn finish<T: Send + Sync + 'static>(
    &mut self,
    ctx_data: ContextData<T>,
    take_order: impl FnOnce(&mut T) -> Option<Order>,
  ) -> Result<&Order, AppError> {
    match self.state.flows.run(ctx_data.clone()).await? {
      PipelineResult::Completed => {
        if let Some(order) = ctx_data.update(take_order) {
          info!(order_id = %order.id, status = %order.status, "Payment step recorded.");
          self.order = order;
        }
        Ok(&self.order)
      }
      PipelineResult::Stopped => Err(AppError::Internal("Payment was halted by an internal step".to_string())),
    }
  }
}
