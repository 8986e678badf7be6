// apps/storefront/src/pipelines/payment_pipeline.rs

use crate::errors::AppError;
use crate::models::{OrderStatus, PaymentUpdate};
use crate::pipelines::common_steps::load_owned_order;
use crate::pipelines::contexts::{SimulatePaymentCtxData, SubmitProofCtxData};
use chrono::Utc;
use storeflow::{ContextData, Flows, Pipeline, PipelineControl};
use tracing::{info, warn};

/// Largest accepted proof image.
pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;
/// Proof URL recorded by the demo payment shortcut.
pub const SIMULATED_PROOF_URL: &str = "https://via.placeholder.com/400x300?text=QRIS+Payment+Success";

/// `payment-proofs/<order id>-<epoch millis>.<extension>`
///
/// The extension is the file name's last suffix, or comes from the image
/// content type when the name has none.
pub fn proof_path(order_id: &str, file_name: &str, content_type: &str, epoch_millis: i64) -> String {
  let extension = file_name
    .rsplit_once('.')
    .map(|(_, ext)| ext.trim())
    .filter(|ext| !ext.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| extension_for(content_type));
  format!("payment-proofs/{}-{}.{}", order_id, epoch_millis, extension)
}

fn extension_for(content_type: &str) -> String {
  let subtype = content_type
    .split(';')
    .next()
    .and_then(|essence| essence.split_once('/'))
    .map(|(_, sub)| sub.split('+').next().unwrap_or(sub).trim().to_ascii_lowercase())
    .unwrap_or_default();
  match subtype.as_str() {
    "jpeg" | "pjpeg" => "jpg".to_string(),
    "" => "bin".to_string(),
    other if other.chars().all(|c| c.is_ascii_alphanumeric()) => other.to_string(),
    _ => "bin".to_string(),
  }
}

pub fn register_submit_proof_pipeline(flows: &Flows<AppError>) {
  let mut p = Pipeline::<SubmitProofCtxData, AppError>::new(&[
    ("validate_proof_file", false, None),
    ("check_order_accepts_proof", false, None),
    ("upload_proof", false, None),
    ("resolve_proof_url", false, None),
    ("mark_waiting_confirmation", false, None),
  ]);

  p.on("validate_proof_file", |ctx_data: ContextData<SubmitProofCtxData>| {
    Box::pin(async move {
      let (content_type, size) = ctx_data.with(|d| (d.file.content_type.clone(), d.file.bytes.len()));
      if size == 0 {
        return Err(AppError::Validation("Please choose a payment proof first".to_string()));
      }
      if !content_type.starts_with("image/") {
        warn!(%content_type, "Rejected a non-image payment proof.");
        return Err(AppError::Validation("File must be an image".to_string()));
      }
      if size > MAX_PROOF_BYTES {
        warn!(size, "Rejected an oversized payment proof.");
        return Err(AppError::Validation("Maximum file size is 5MB".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("check_order_accepts_proof", |ctx_data: ContextData<SubmitProofCtxData>| {
    Box::pin(async move {
      let (rows, user, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.backend.rows.clone(), guard.user.clone(), guard.order_id.clone())
      };
      let order = load_owned_order(rows, &user, &order_id).await?;
      if !order.status.accepts_payment_proof() {
        warn!(order_id = %order.id, status = %order.status, "Payment proof sent for a settled order.");
        return Err(AppError::Validation(format!(
          "Order is already {} and no longer accepts a payment proof",
          order.status.label().to_lowercase()
        )));
      }
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("upload_proof", |ctx_data: ContextData<SubmitProofCtxData>| {
    Box::pin(async move {
      let (blobs, path, content_type, bytes) = {
        let guard = ctx_data.read();
        let path = proof_path(
          &guard.order_id,
          &guard.file.file_name,
          &guard.file.content_type,
          Utc::now().timestamp_millis(),
        );
        (
          guard.app_state.backend.blobs.clone(),
          path,
          guard.file.content_type.clone(),
          guard.file.bytes.clone(),
        )
      };
      blobs
        .upload(&path, &content_type, bytes)
        .await
        .map_err(AppError::backend("Upload payment proof"))?;
      info!(%path, "Payment proof uploaded.");
      ctx_data.write().proof_path = Some(path);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("resolve_proof_url", |ctx_data: ContextData<SubmitProofCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let url = guard
        .proof_path
        .as_deref()
        .map(|path| guard.app_state.backend.blobs.public_url(path));
      guard.proof_url = url;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("mark_waiting_confirmation", |ctx_data: ContextData<SubmitProofCtxData>| {
    Box::pin(async move {
      let (rows, order_id, proof_url) = {
        let guard = ctx_data.read();
        (
          guard.app_state.backend.rows.clone(),
          guard.order_id.clone(),
          guard.proof_url.clone().unwrap_or_default(),
        )
      };
      let update = PaymentUpdate {
        status: OrderStatus::WaitingConfirmation,
        payment_proof_url: proof_url,
        updated_at: None,
      };
      rows
        .update_order_payment(&order_id, &update)
        .await
        .map_err(AppError::backend("Update order"))?;
      info!(%order_id, "Order is waiting for payment confirmation.");

      if let Some(order) = ctx_data.write().order.as_mut() {
        order.status = update.status;
        order.payment_proof_url = Some(update.payment_proof_url);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register(p);
  info!("Payment proof pipeline registered.");
}

/// Demo shortcut that marks an unpaid order as paid.
pub fn register_simulate_payment_pipeline(flows: &Flows<AppError>) {
  let mut p = Pipeline::<SimulatePaymentCtxData, AppError>::new(&[
    ("load_order", false, None),
    ("mark_processing", false, None),
  ]);

  p.on("load_order", |ctx_data: ContextData<SimulatePaymentCtxData>| {
    Box::pin(async move {
      let (rows, user, order_id) = ctx_data.with(|d| (d.app_state.backend.rows.clone(), d.user.clone(), d.order_id.clone()));
      let order = load_owned_order(rows, &user, &order_id).await?;
      if !order.status.can_transition_to(OrderStatus::Processing) {
        warn!(order_id = %order.id, status = %order.status, "Simulated payment for an order that cannot move to processing.");
        return Err(AppError::Validation(format!(
          "Order is already {}",
          order.status.label().to_lowercase()
        )));
      }
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("mark_processing", |ctx_data: ContextData<SimulatePaymentCtxData>| {
    Box::pin(async move {
      let (rows, order_id) = ctx_data.with(|d| (d.app_state.backend.rows.clone(), d.order_id.clone()));
      let update = PaymentUpdate {
        status: OrderStatus::Processing,
        payment_proof_url: SIMULATED_PROOF_URL.to_string(),
        updated_at: Some(Utc::now()),
      };
      rows
        .update_order_payment(&order_id, &update)
        .await
        .map_err(AppError::backend("Process payment"))?;
      info!(%order_id, "Simulated payment recorded.");

      if let Some(order) = ctx_data.write().order.as_mut() {
        order.status = update.status;
        order.payment_proof_url = Some(update.payment_proof_url);
        order.updated_at = update.updated_at;
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  flows.register(p);
  info!("Simulated payment pipeline registered.");
}
