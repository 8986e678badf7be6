// tests/auth_tests.rs
mod common;

use common::{customer, harness, Harness, PASSWORD};
use serial_test::serial;
use storeflow::{ContextData, PipelineResult};
use sweetify_storefront::errors::AppError;
use sweetify_storefront::pipelines::contexts::{SignInCtxData, SignUpCtxData};
use sweetify_storefront::services::auth_service::SignUpInput;
use sweetify_storefront::services::session::{AuthEventKind, SessionUser};
use tokio::sync::broadcast::error::TryRecvError;

async fn sign_up(h: &Harness, full_name: &str, email: &str, password: &str) -> Result<ContextData<SignUpCtxData>, AppError> {
  let ctx_data = ContextData::new(SignUpCtxData {
    app_state: h.state.clone(),
    input: SignUpInput {
      full_name: full_name.to_string(),
      email: email.to_string(),
      password: password.to_string(),
      confirm_password: password.to_string(),
    },
    outcome: None,
    user: None,
  });
  let result = h.state.flows.run(ctx_data.clone()).await?;
  assert_eq!(result, PipelineResult::Completed);
  Ok(ctx_data)
}

async fn sign_in(h: &Harness, email: &str, password: &str) -> Result<SessionUser, AppError> {
  let ctx_data = ContextData::new(SignInCtxData {
    app_state: h.state.clone(),
    email: email.to_string(),
    password: password.to_string(),
    user: None,
    profile: None,
  });
  h.state.flows.run(ctx_data.clone()).await?;
  Ok(ctx_data.with(|d| d.user.clone()).expect("signed in user"))
}

#[tokio::test]
#[serial]
async fn sign_up_creates_the_profile_and_announces_the_session() {
  let h = harness();
  let mut events = h.state.gate.events().subscribe();

  let ctx_data = sign_up(&h, "Dewi Lestari", "dewi@sweetify.id", PASSWORD).await.expect("sign up");
  let user = ctx_data.with(|d| d.user.clone()).expect("confirmed accounts are signed in");
  assert_eq!(user.full_name.as_deref(), Some("Dewi Lestari"));
  assert!(!user.is_admin());

  let profile = h.backend.profile(&user.id).expect("profile created");
  assert_eq!(profile.full_name, "Dewi Lestari");
  assert_eq!(profile.email.as_deref(), Some("dewi@sweetify.id"));
  assert!(profile.phone.is_empty() && profile.address.is_empty());

  let event = events.try_recv().expect("sign-in event");
  assert_eq!(event.kind, AuthEventKind::SignedIn);
  assert_eq!(event.user_id.as_deref(), Some(user.id.as_str()));
}

#[tokio::test]
#[serial]
async fn pending_confirmation_skips_the_profile_and_the_session() {
  let h = harness();
  h.backend.require_email_confirmation(true);
  let mut events = h.state.gate.events().subscribe();

  let ctx_data = sign_up(&h, "Dewi Lestari", "dewi@sweetify.id", PASSWORD).await.expect("sign up");
  let (needs_confirmation, user) = ctx_data.with(|d| {
    (
      d.outcome.as_ref().map(|o| o.needs_confirmation()),
      d.user.clone(),
    )
  });
  assert_eq!(needs_confirmation, Some(true));
  assert!(user.is_none());
  assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

  match sign_in(&h, "dewi@sweetify.id", PASSWORD).await {
    Err(AppError::Validation(message)) => assert_eq!(message, "Email not verified yet. Check your inbox!"),
    other => panic!("unexpected sign-in result {:?}", other.map(|u| u.id)),
  }

  h.backend.confirm_email("dewi@sweetify.id");
  let user = sign_in(&h, "dewi@sweetify.id", PASSWORD).await.expect("confirmed sign in");
  assert!(h.backend.profile(&user.id).is_some());
}

#[tokio::test]
async fn duplicate_and_invalid_sign_ups_are_refused() {
  let h = harness();
  sign_up(&h, "Dewi", "dewi@sweetify.id", PASSWORD).await.expect("first sign up");

  let cases = [
    ("Dewi", "dewi@sweetify.id", PASSWORD, "Email is already registered. Please sign in."),
    ("", "rina@sweetify.id", PASSWORD, "All fields are required"),
    ("Rina", "rina@", PASSWORD, "Invalid email format"),
    ("Rina", "rina@sweetify.id", "12345", "Password must be at least 6 characters"),
  ];
  for (name, email, password, expected) in cases {
    match sign_up(&h, name, email, password).await {
      Err(AppError::Validation(message)) => assert_eq!(message, expected),
      Err(other) => panic!("unexpected error {:?}", other),
      Ok(_) => panic!("sign up for '{}' should fail", email),
    }
  }
}

#[tokio::test]
async fn wrong_password_is_reported_plainly() {
  let h = harness();
  customer(&h, "sari@sweetify.id", "Sari").await;
  let result = sign_in(&h, "sari@sweetify.id", "salah-sandi").await;
  assert!(matches!(result, Err(AppError::Validation(ref m)) if m == "Wrong email or password"));
  let blank = sign_in(&h, "  ", "").await;
  assert!(matches!(blank, Err(AppError::Validation(ref m)) if m == "Email and password are required"));
}

#[tokio::test]
async fn admin_is_recognised_by_email() {
  let h = harness();
  sign_up(&h, "Admin", "admin@sweetify.id", PASSWORD).await.expect("sign up");
  let admin = sign_in(&h, "admin@sweetify.id", PASSWORD).await.expect("sign in");
  assert!(admin.is_admin());
  assert!(h.state.gate.require_admin(Some(&admin.access_token)).await.is_ok());

  let shopper = customer(&h, "sari@sweetify.id", "Sari").await;
  assert!(matches!(
    h.state.gate.require_admin(Some(&shopper.access_token)).await,
    Err(AppError::Identity { .. })
  ));
}

#[tokio::test]
async fn sign_in_recreates_a_missing_profile_but_survives_without_one() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  assert!(h.backend.profile(&user.id).is_none());

  h.backend.fail_on("insert_profile");
  sign_in(&h, "sari@sweetify.id", PASSWORD).await.expect("profile is optional at sign-in");
  assert!(h.backend.profile(&user.id).is_none());

  h.backend.heal("insert_profile");
  sign_in(&h, "sari@sweetify.id", PASSWORD).await.expect("sign in");
  assert_eq!(h.backend.profile(&user.id).map(|p| p.full_name), Some("Sari".to_string()));
}

#[tokio::test]
#[serial]
async fn sign_out_ends_the_session_and_announces_it() {
  let h = harness();
  let user = customer(&h, "sari@sweetify.id", "Sari").await;
  let mut events = h.state.gate.events().subscribe();

  h.state.gate.sign_out(Some(&user.access_token)).await.expect("sign out");
  let event = events.try_recv().expect("sign-out event");
  assert_eq!(event.kind, AuthEventKind::SignedOut);
  assert_eq!(event.user_id.as_deref(), Some(user.id.as_str()));
  assert!(h.state.gate.current_user(Some(&user.access_token)).await.is_none());
}
