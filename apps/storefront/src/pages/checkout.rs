// apps/storefront/src/pages/checkout.rs

use crate::errors::{AppError, SAFE_PAGE};
use crate::models::{CartLine, Order};
use crate::persistence::LocalMirror;
use crate::pipelines::contexts::{CheckoutForm, PlaceOrderCtxData};
use crate::services::pricing::{PriceQuote, GOSEND};
use crate::services::session::SessionUser;
use crate::state::AppState;
use serde::Serialize;
use storeflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Form values shown when the checkout page opens.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrefilledContact {
  pub full_name: String,
  pub phone: String,
  pub address: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutView {
  pub lines: Vec<CartLine>,
  pub contact: PrefilledContact,
  pub delivery_method: String,
  pub quote: PriceQuote,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrder {
  pub order: Order,
  pub next_page: String,
}

pub struct CheckoutPage {
  state: AppState,
  user: SessionUser,
  lines: Vec<CartLine>,
}

impl CheckoutPage {
  /// Signed-in users with a non-empty checkout snapshot only.
  #[instrument(name = "CheckoutPage::enter", skip(state, access_token))]
  pub async fn enter(state: &AppState, access_token: Option<&str>, device_id: Uuid) -> Result<Self, AppError> {
    let user = state.gate.require_user(access_token).await?;
    let lines = state.mirror_for(device_id).load_checkout();
    if lines.is_empty() {
      warn!(user_id = %user.id, "Checkout opened without a cart snapshot.");
      return Err(AppError::redirect("Your cart is empty", SAFE_PAGE));
    }
    Ok(Self {
      state: state.clone(),
      user,
      lines,
    })
  }

  /// Recomputes the price summary for a delivery method.
  pub fn quote(&self, delivery_method: &str) -> PriceQuote {
    PriceQuote::for_lines(&self.lines, delivery_method, self.state.config.delivery_fee)
  }

  /// Snapshot, a form pre-filled from the profile, and a price quote.
  ///
  /// A profile that cannot be loaded only leaves the form blank.
  pub async fn view(&self, delivery_method: Option<&str>) -> CheckoutView {
    let contact = match self.state.backend.rows.find_profile(&self.user.id).await {
      Ok(Some(profile)) => PrefilledContact {
        full_name: profile.full_name,
        phone: profile.phone,
        address: profile.address,
      },
      Ok(None) => PrefilledContact {
        full_name: self.user.default_display_name(),
        ..PrefilledContact::default()
      },
      Err(e) => {
        warn!(error = %e, "Could not pre-fill the checkout form.");
        PrefilledContact::default()
      }
    };
    let delivery_method = delivery_method.unwrap_or(GOSEND).to_string();
    CheckoutView {
      lines: self.lines.clone(),
      contact,
      quote: self.quote(&delivery_method),
      delivery_method,
    }
  }

  /// Places the order for the device's checkout snapshot.
  ///
  /// Runs before any page gate so that bad input is refused without a single
  /// remote call. A second submission from the same device while one is
  /// running is refused.
  #[instrument(name = "CheckoutPage::place_order", skip(state, access_token, form))]
  pub async fn place_order(
    state: &AppState,
    access_token: Option<&str>,
    device_id: Uuid,
    form: CheckoutForm,
  ) -> Result<PlacedOrder, AppError> {
    let _in_flight = state.begin_checkout(device_id)?;
    let mirror: LocalMirror = state.mirror_for(device_id);
    let lines = mirror.load_checkout();
    let ctx_data = ContextData::new(PlaceOrderCtxData::new(
      state.clone(),
      access_token.map(str::to_string),
      mirror,
      form,
      lines,
    ));

    match state.flows.run(ctx_data.clone()).await? {
      PipelineResult::Completed => {
        let (order, next_page) = {
          let mut guard = ctx_data.write();
          (guard.order.take(), guard.next_page.take())
        };
        let order = order.ok_or_else(|| AppError::Internal("Order placement finished without an order".to_string()))?;
        info!(order_id = %order.id, order_number = %order.order_number, "Order placed.");
        Ok(PlacedOrder {
          next_page: next_page.unwrap_or_else(|| format!("payment.html?order={}", order.id)),
          order,
        })
      }
      PipelineResult::Stopped => Err(AppError::Internal("Order placement was halted by an internal step".to_string())),
    }
  }
}
