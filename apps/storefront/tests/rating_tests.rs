// tests/rating_tests.rs
mod common;

use common::{customer, harness, placed_order};
use sweetify_storefront::errors::AppError;
use sweetify_storefront::models::OrderStatus;
use sweetify_storefront::pages::{OrderTab, OrdersPage};
use sweetify_storefront::pipelines::contexts::RatingEntry;

fn stars(product_id: &str, rating: u8, review: Option<&str>) -> RatingEntry {
  RatingEntry {
    product_id: product_id.to_string(),
    rating,
    review: review.map(str::to_string),
  }
}

#[tokio::test]
async fn no_stars_means_nothing_is_written() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  let order = placed_order(&h, &user, &[("p1", 1), ("p3", 1)]).await;
  h.backend.set_order_status(&order.id, OrderStatus::Completed);
  let page = OrdersPage::load_orders(&h.state, Some(&user.access_token)).await.expect("orders");
  let writes_before = h.backend.writes();

  let result = page
    .submit_ratings(&order.id, vec![stars("p1", 0, Some("enak")), stars("p3", 0, None)])
    .await;
  assert!(matches!(result, Err(AppError::Validation(ref m)) if m == "Please select at least one star"));
  assert_eq!(h.backend.writes(), writes_before);
  assert!(h.backend.ratings().is_empty());
}

#[tokio::test]
async fn only_completed_orders_can_be_rated() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  let order = placed_order(&h, &user, &[("p1", 1)]).await;
  let page = OrdersPage::load_orders(&h.state, Some(&user.access_token)).await.expect("orders");

  let result = page.submit_ratings(&order.id, vec![stars("p1", 4, None)]).await;
  assert!(matches!(result, Err(AppError::Validation(_))));
  assert!(h.backend.ratings().is_empty());
}

#[tokio::test]
async fn starred_products_are_saved_and_a_resubmission_overwrites() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  let order = placed_order(&h, &user, &[("p1", 1), ("p3", 2)]).await;
  h.backend.set_order_status(&order.id, OrderStatus::Completed);
  let page = OrdersPage::load_orders(&h.state, Some(&user.access_token)).await.expect("orders");

  let saved = page
    .submit_ratings(&order.id, vec![stars("p1", 5, Some("  Lembut sekali  ")), stars("p3", 0, None)])
    .await
    .expect("ratings saved");
  assert_eq!(saved.len(), 1);
  assert_eq!(saved[0].review.as_deref(), Some("Lembut sekali"));

  page
    .submit_ratings(&order.id, vec![stars("p1", 3, None), stars("p3", 4, Some("   "))])
    .await
    .expect("ratings updated");
  let mut stored = h.backend.ratings();
  stored.sort_by(|a, b| a.product_id.cmp(&b.product_id));
  assert_eq!(stored.len(), 2);
  assert_eq!((stored[0].product_id.as_str(), stored[0].rating), ("p1", 3));
  assert_eq!(stored[0].review, None);
  assert_eq!((stored[1].product_id.as_str(), stored[1].rating), ("p3", 4));
  assert!(stored.iter().all(|r| r.user_id == user.id && r.order_id == order.id));
}

#[tokio::test]
async fn out_of_range_and_foreign_products_are_refused() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  let order = placed_order(&h, &user, &[("p1", 1)]).await;
  h.backend.set_order_status(&order.id, OrderStatus::Completed);
  let page = OrdersPage::load_orders(&h.state, Some(&user.access_token)).await.expect("orders");

  assert!(matches!(
    page.submit_ratings(&order.id, vec![stars("p1", 6, None)]).await,
    Err(AppError::Validation(_))
  ));
  assert!(matches!(
    page.submit_ratings(&order.id, vec![stars("p5", 5, None)]).await,
    Err(AppError::Validation(_))
  ));
  assert!(h.backend.ratings().is_empty());
}

#[tokio::test]
async fn rating_form_shows_what_was_already_rated() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  let order = placed_order(&h, &user, &[("p1", 1), ("p8", 1)]).await;
  h.backend.set_order_status(&order.id, OrderStatus::Completed);
  let page = OrdersPage::load_orders(&h.state, Some(&user.access_token)).await.expect("orders");
  page
    .submit_ratings(&order.id, vec![stars("p8", 4, None)])
    .await
    .expect("ratings saved");

  let form = page.rating_form(&order.id).await.expect("form");
  assert_eq!(form.order_number, order.order_number);
  assert_eq!(form.lines.len(), 2);
  let tart = form.lines.iter().find(|l| l.product_id == "p8").expect("p8 line");
  assert_eq!(tart.product_name, "Lemon Tart");
  assert_eq!(tart.existing.as_ref().map(|r| r.rating), Some(4));
  let cake = form.lines.iter().find(|l| l.product_id == "p1").expect("p1 line");
  assert!(cake.existing.is_none());
}

#[tokio::test]
async fn history_tabs_group_unpaid_orders() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  let unpaid = placed_order(&h, &user, &[("p1", 1)]).await;
  let waiting = placed_order(&h, &user, &[("p2", 1)]).await;
  let done = placed_order(&h, &user, &[("p3", 1)]).await;
  h.backend.set_order_status(&waiting.id, OrderStatus::WaitingConfirmation);
  h.backend.set_order_status(&done.id, OrderStatus::Completed);

  let page = OrdersPage::load_orders(&h.state, Some(&user.access_token)).await.expect("orders");
  assert_eq!(page.orders().len(), 3);

  let pending: Vec<String> = page.view(OrderTab::Pending).orders.into_iter().map(|s| s.order.id).collect();
  assert_eq!(pending.len(), 2);
  assert!(pending.contains(&unpaid.id) && pending.contains(&waiting.id));

  let completed = page.view(OrderTab::Completed);
  assert_eq!(completed.orders.len(), 1);
  assert!(completed.orders[0].can_rate);
  assert!(!completed.orders[0].can_pay);
  assert!(page.view(OrderTab::Shipping).orders.is_empty());
}
