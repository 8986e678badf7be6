// apps/storefront/src/pipelines/checkout_pipeline.rs

use crate::errors::AppError;
use crate::format::generate_order_number;
use crate::models::{NewOrder, OrderLine, OrderStatus};
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::services::cart::MAX_LINE_QUANTITY;
use crate::services::pricing::PriceQuote;
use crate::services::profile::{ensure_profile, ContactDetails};
use storeflow::{ContextData, Flows, Pipeline, PipelineControl};
use tracing::{error, info, warn};

/// Registers the order placement pipeline.
///
/// Header, lines and profile are separate writes. A failure after the header
/// is stored leaves it behind; that order id is logged at ERROR.
pub fn register_checkout_pipeline(flows: &Flows<AppError>) {
  let mut p = Pipeline::<PlaceOrderCtxData, AppError>::new(&[
    ("validate_checkout_form", false, None),
    ("verify_session", false, None),
    ("price_order", false, None),
    ("create_order_header", false, None),
    ("create_order_lines", false, None),
    ("sync_profile_contact", false, None),
    ("clear_local_cart", false, None),
    ("handoff_to_payment", false, None),
  ]);

  // Nothing here touches the network.
  p.on("validate_checkout_form", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (form, line_count, bad_quantity) = {
        let guard = ctx_data.read();
        let bad_quantity = guard
          .lines
          .iter()
          .find(|l| l.quantity == 0 || l.quantity > MAX_LINE_QUANTITY)
          .map(|l| (l.product_id.clone(), l.quantity));
        (guard.form.clone(), guard.lines.len(), bad_quantity)
      };
      if line_count == 0 {
        warn!("Order placement attempted with an empty cart.");
        return Err(AppError::Validation("Your cart is empty".to_string()));
      }
      if let Some((product_id, quantity)) = bad_quantity {
        warn!(product_id = %product_id, quantity, "Checkout snapshot holds an out-of-range quantity.");
        return Err(AppError::Validation(format!(
          "Quantity per item must be between 1 and {}",
          MAX_LINE_QUANTITY
        )));
      }
      ContactDetails::parse(&form.full_name, &form.phone, &form.address)
        .ok()
        .filter(|_| !form.delivery_method.trim().is_empty() && !form.payment_method.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Please complete all required fields".to_string()))?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("verify_session", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (gate, token) = {
        let guard = ctx_data.read();
        (guard.app_state.gate.clone(), guard.access_token.clone())
      };
      let user = gate.require_user(token.as_deref()).await?;
      ctx_data.write().user = Some(user);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("price_order", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let flat_fee = guard.app_state.config.delivery_fee;
      let quote = PriceQuote::for_lines(&guard.lines, guard.form.delivery_method.trim(), flat_fee);
      info!(subtotal = quote.subtotal, delivery_fee = quote.delivery_fee, total = quote.total, "Order priced.");
      guard.quote = Some(quote);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("create_order_header", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (rows, new_order) = {
        let guard = ctx_data.read();
        let user = guard
          .user
          .as_ref()
          .ok_or_else(|| AppError::Internal("Order header requested before the session was verified".to_string()))?;
        let total_amount = guard
          .quote
          .as_ref()
          .map(|q| q.total)
          .ok_or_else(|| AppError::Internal("Order header requested before pricing".to_string()))?;
        let contact = ContactDetails::parse(&guard.form.full_name, &guard.form.phone, &guard.form.address)?;
        let new_order = NewOrder {
          user_id: user.id.clone(),
          order_number: generate_order_number(),
          total_amount,
          status: OrderStatus::Pending,
          payment_method: guard.form.payment_method.trim().to_string(),
          delivery_address: contact.delivery_block(),
          delivery_method: guard.form.delivery_method.trim().to_string(),
          is_preorder: false,
        };
        (guard.app_state.backend.rows.clone(), new_order)
      };

      let order = rows
        .insert_order(&new_order)
        .await
        .map_err(AppError::backend("Create order"))?;
      info!(order_id = %order.id, order_number = %order.order_number, "Order header stored.");
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("create_order_lines", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (rows, order_id, lines) = {
        let guard = ctx_data.read();
        let order_id = guard
          .order
          .as_ref()
          .map(|o| o.id.clone())
          .ok_or_else(|| AppError::Internal("Order lines requested before the header".to_string()))?;
        let lines = guard
          .lines
          .iter()
          .map(|line| {
            let quantity = i32::try_from(line.quantity)
              .map_err(|_| AppError::Validation(format!("Quantity for {} is out of range", line.name)))?;
            Ok(OrderLine {
              order_id: order_id.clone(),
              product_id: line.product_id.clone(),
              product_name: line.name.clone(),
              product_price: line.unit_price,
              quantity,
              subtotal: line.unit_price * i64::from(quantity),
            })
          })
          .collect::<Result<Vec<OrderLine>, AppError>>()?;
        (guard.app_state.backend.rows.clone(), order_id, lines)
      };

      if let Err(e) = rows.insert_order_lines(&lines).await {
        error!(order_id = %order_id, error = %e, "Order lines failed; the order header is orphaned.");
        return Err(AppError::backend("Create order items")(e));
      }
      if let Some(order) = ctx_data.write().order.as_mut() {
        order.lines = lines;
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("sync_profile_contact", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (rows, user, contact, order_id) = {
        let guard = ctx_data.read();
        let user = guard
          .user
          .clone()
          .ok_or_else(|| AppError::Internal("Profile sync requested before the session was verified".to_string()))?;
        let contact = ContactDetails::parse(&guard.form.full_name, &guard.form.phone, &guard.form.address)?;
        let order_id = guard.order.as_ref().map(|o| o.id.clone()).unwrap_or_default();
        (guard.app_state.backend.rows.clone(), user, contact, order_id)
      };
      if let Err(e) = ensure_profile(rows.as_ref(), &user).await {
        error!(order_id = %order_id, error = %e, "Profile could not be prepared after the order was stored.");
        return Err(e);
      }
      if let Err(e) = rows
        .update_profile_contact(&user.id, &contact.full_name, &contact.phone, &contact.address)
        .await
      {
        error!(order_id = %order_id, error = %e, "Profile update failed after the order was stored.");
        return Err(AppError::backend("Update profile")(e));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("clear_local_cart", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let mirror = ctx_data.read().mirror.clone();
      if !mirror.clear_after_order() {
        warn!("Local cart could not be cleared after the order was placed.");
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("handoff_to_payment", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let next = guard.order.as_ref().map(|o| format!("payment.html?order={}", o.id));
      guard.next_page = next;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register(p);
  info!("Checkout pipeline registered.");
}
