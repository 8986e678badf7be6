// tests/checkout_tests.rs
mod common;

use common::{checkout_snapshot, customer, form, harness};
use sweetify_storefront::errors::AppError;
use sweetify_storefront::models::OrderStatus;
use sweetify_storefront::pages::CheckoutPage;
use sweetify_storefront::persistence::{CART_KEY, CHECKOUT_KEY};
use sweetify_storefront::services::cart::MAX_LINE_QUANTITY;

#[tokio::test]
async fn empty_cart_is_rejected_before_any_backend_call() {
  let h = harness();
  let user = customer(&h, "budi@sweetify.id", "Budi").await;
  let calls_before = h.backend.calls();

  let result = CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend")).await;
  assert!(matches!(result, Err(AppError::Validation(ref m)) if m == "Your cart is empty"));
  assert_eq!(h.backend.calls(), calls_before);
  assert_eq!(h.backend.order_count(), 0);
}

#[tokio::test]
async fn blank_form_fields_are_rejected_before_any_backend_call() {
  let h = harness();
  let user = customer(&h, "budi@sweetify.id", "Budi").await;
  checkout_snapshot(&h, &user, &[("p1", 1)]).await;
  let calls_before = h.backend.calls();

  let mut blank_phone = form("gosend");
  blank_phone.phone = "   ".to_string();
  let mut no_payment = form("gosend");
  no_payment.payment_method = String::new();

  for bad in [blank_phone, no_payment] {
    let result = CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, bad).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
  }
  assert_eq!(h.backend.calls(), calls_before);
}

#[tokio::test]
async fn out_of_range_snapshot_quantity_is_rejected_before_any_backend_call() {
  let h = harness();
  let user = customer(&h, "budi@sweetify.id", "Budi").await;
  checkout_snapshot(&h, &user, &[("p1", 1)]).await;
  let mut lines = h.mirror().load_checkout();
  lines[0].quantity = u32::MAX;
  assert!(h.mirror().save_checkout(&lines));
  let calls_before = h.backend.calls();

  let result = CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend")).await;
  assert!(matches!(result, Err(AppError::Validation(ref m)) if m.contains(&MAX_LINE_QUANTITY.to_string())));
  assert_eq!(h.backend.calls(), calls_before);
  assert_eq!(h.backend.order_count(), 0);
}

#[tokio::test]
async fn two_strawberry_cakes_by_courier_cost_125000() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  checkout_snapshot(&h, &user, &[("p1", 2)]).await;

  let page = CheckoutPage::enter(&h.state, Some(&user.access_token), h.device).await.expect("enter");
  let quote = page.quote("gosend");
  assert_eq!((quote.subtotal, quote.delivery_fee, quote.total), (110000, 15000, 125000));

  let placed = CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend"))
    .await
    .expect("order placed");
  let order = h.backend.order(&placed.order.id).expect("stored order");
  assert_eq!(order.total_amount, 125000);
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.user_id, user.id);
  assert_eq!(order.delivery_method, "gosend");
  assert_eq!(order.payment_method, "qris");
  assert!(!order.is_preorder);
  assert_eq!(order.delivery_address, "Sari Wulandari\n081234567890\nJl. Kenanga No. 3, Bandung");
  assert!(order.order_number.starts_with("SW"));
  assert_eq!(order.order_number.len(), 14);

  assert_eq!(order.lines.len(), 1);
  let line = &order.lines[0];
  assert_eq!((line.product_id.as_str(), line.product_price, line.quantity, line.subtotal), ("p1", 55000, 2, 110000));
  assert_eq!(placed.next_page, format!("payment.html?order={}", order.id));
}

#[tokio::test]
async fn pickup_has_no_delivery_fee() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  checkout_snapshot(&h, &user, &[("p6", 1)]).await;

  let placed = CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("pickup"))
    .await
    .expect("order placed");
  assert_eq!(placed.order.total_amount, 22000);
}

#[tokio::test]
async fn success_clears_the_local_cart_and_updates_the_profile() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  checkout_snapshot(&h, &user, &[("p2", 1), ("p8", 2)]).await;

  CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend"))
    .await
    .expect("order placed");

  let mirror = h.mirror();
  assert!(mirror.read_raw(CART_KEY).is_none());
  assert!(mirror.read_raw(CHECKOUT_KEY).is_none());

  let profile = h.backend.profile(&user.id).expect("profile");
  assert_eq!(profile.full_name, "Sari Wulandari");
  assert_eq!(profile.phone, "081234567890");
  assert_eq!(profile.address, "Jl. Kenanga No. 3, Bandung");
}

#[tokio::test]
async fn failed_lines_leave_the_header_and_keep_the_cart() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  checkout_snapshot(&h, &user, &[("p1", 1)]).await;
  h.backend.fail_on("insert_order_lines");

  let result = CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend")).await;
  match result {
    Err(AppError::Backend { operation, .. }) => assert_eq!(operation, "Create order items"),
    other => panic!("expected a backend error, got {:?}", other.map(|p| p.order.id)),
  }
  // No rollback: the header stays behind.
  assert_eq!(h.backend.order_count(), 1);
  assert!(h.mirror().read_raw(CHECKOUT_KEY).is_some());
}

#[tokio::test]
async fn profile_failure_fails_the_whole_operation() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  checkout_snapshot(&h, &user, &[("p1", 1)]).await;
  h.backend.fail_on("update_profile_contact");

  let result = CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend")).await;
  assert!(matches!(result, Err(AppError::Backend { .. })));
  assert!(h.mirror().read_raw(CHECKOUT_KEY).is_some());
}

#[tokio::test]
async fn signed_out_checkout_is_redirected() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  checkout_snapshot(&h, &user, &[("p1", 1)]).await;

  let result = CheckoutPage::place_order(&h.state, None, h.device, form("gosend")).await;
  assert!(matches!(result, Err(AppError::Identity { .. })));
  assert!(matches!(
    CheckoutPage::enter(&h.state, Some("stale-token"), h.device).await,
    Err(AppError::Identity { .. })
  ));
  assert_eq!(h.backend.order_count(), 0);
}

#[tokio::test]
async fn entering_without_a_snapshot_redirects_home() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  match CheckoutPage::enter(&h.state, Some(&user.access_token), h.device).await {
    Err(AppError::Redirect { redirect_to, .. }) => assert_eq!(redirect_to, "index.html"),
    Err(other) => panic!("unexpected error {:?}", other),
    Ok(_) => panic!("checkout opened without a snapshot"),
  }
}

#[tokio::test]
async fn checkout_view_prefills_from_the_profile() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  checkout_snapshot(&h, &user, &[("p1", 1)]).await;

  let page = CheckoutPage::enter(&h.state, Some(&user.access_token), h.device).await.expect("enter");
  let view = page.view(None).await;
  assert_eq!(view.contact.full_name, "Sari");
  assert_eq!(view.delivery_method, "gosend");
  assert_eq!(view.quote.total, 55000 + 15000);
  assert_eq!(page.view(Some("pickup")).await.quote.total, 55000);
}

#[tokio::test]
async fn double_submission_is_refused_while_one_is_in_flight() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  checkout_snapshot(&h, &user, &[("p1", 1)]).await;

  let in_flight = h.state.begin_checkout(h.device).expect("first submission");
  let second = CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend")).await;
  assert!(matches!(second, Err(AppError::Conflict(_))));
  drop(in_flight);

  CheckoutPage::place_order(&h.state, Some(&user.access_token), h.device, form("gosend"))
    .await
    .expect("allowed once the first finished");
  assert_eq!(h.backend.order_count(), 1);
}
