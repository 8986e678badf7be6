// tests/error_handling_tests.rs
mod common;

use common::*;
use serial_test::serial;
use storeflow::{ContextData, FlowError, Pipeline, PipelineResult};

#[tokio::test]
#[serial]
async fn required_step_without_handlers_is_reported() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("first", false, None), ("missing", false, None)]);
  pipeline.on("first", recording_handler("first"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  match result {
    Err(TestError::Flow(msg)) => assert!(msg.contains("HandlerMissing") && msg.contains("missing")),
    other => panic!("expected HandlerMissing, got {:?}", other),
  }
  assert_eq!(ctx.read().trail, vec!["first"]);
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_passed_over() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("maybe", true, None), ("always", false, None)]);
  pipeline.on("always", recording_handler("always"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx.read().trail, vec!["always"]);
}

#[tokio::test]
#[serial]
async fn handler_on_undeclared_step_fails_the_run_before_any_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("declared", false, None)]);
  pipeline.on("declared", recording_handler("declared"));
  pipeline.on("typo_step", recording_handler("typo_step"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  match result {
    Err(TestError::Flow(msg)) => assert!(msg.contains("StepNotFound") && msg.contains("typo_step")),
    other => panic!("expected StepNotFound, got {:?}", other),
  }
  assert!(ctx.read().trail.is_empty());
}

#[test]
fn flow_error_wraps_anyhow_sources() {
  let err: FlowError = anyhow::anyhow!("upstream down").into();
  assert!(matches!(err, FlowError::HandlerError { .. }));
  assert_eq!(err.to_string(), "Handler failed. Source: upstream down");
}
