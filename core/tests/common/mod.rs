// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use storeflow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

/// Context shared by the engine tests: records which handlers ran.
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
  pub guest: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("engine error: {0}")]
  Flow(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Handler that bumps the counter, appends `label` to the trail and stops
/// if the context asks it to.
pub fn recording_handler(label: &'static str) -> storeflow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.trail.push(label.to_string());
      tracing::debug!(target: "test_handlers", label, counter = guard.counter, "executed");
      if guard.stop_at.as_deref() == Some(label) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(label: &'static str, message: &'static str) -> storeflow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
