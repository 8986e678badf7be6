// tests/profile_tests.rs
mod common;

use common::{customer, harness};
use sweetify_storefront::errors::AppError;
use sweetify_storefront::pages::ProfilePage;

#[tokio::test]
async fn opening_the_profile_creates_it_from_the_session() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari Wulandari").await;

  let page = ProfilePage::load(&h.state, Some(&user.access_token)).await.expect("profile page");
  let view = page.view();
  assert_eq!(view.profile.full_name, "Sari Wulandari");
  assert_eq!(view.email, "sari@sweetify.id");
  assert_eq!(view.initials, "SW");
  assert!(h.backend.profile(&user.id).is_some());
}

#[tokio::test]
async fn contact_details_are_trimmed_and_saved() {
  let h = harness();
  let user = customer(&h, "budi@sweetify.id", "Budi").await;
  let mut page = ProfilePage::load(&h.state, Some(&user.access_token)).await.expect("profile page");

  let view = page
    .update("  Budi Santoso ", " 0812 ", " Jl. Mawar 1 ")
    .await
    .expect("profile updated");
  assert_eq!(view.profile.full_name, "Budi Santoso");
  assert_eq!(view.initials, "BS");

  let stored = h.backend.profile(&user.id).expect("stored profile");
  assert_eq!((stored.full_name.as_str(), stored.phone.as_str(), stored.address.as_str()), ("Budi Santoso", "0812", "Jl. Mawar 1"));
}

#[tokio::test]
async fn every_contact_field_is_required() {
  let h = harness();
  let user = customer(&h, "budi@sweetify.id", "Budi").await;
  let mut page = ProfilePage::load(&h.state, Some(&user.access_token)).await.expect("profile page");
  let writes_before = h.backend.writes();

  let result = page.update("Budi", "   ", "Jl. Mawar 1").await;
  assert!(matches!(result, Err(AppError::Validation(ref m)) if m == "Please complete all fields"));
  assert_eq!(h.backend.writes(), writes_before);
}

#[tokio::test]
async fn signed_out_visitors_cannot_open_the_profile() {
  let h = harness();
  assert!(matches!(ProfilePage::load(&h.state, None).await, Err(AppError::Identity { .. })));
}
