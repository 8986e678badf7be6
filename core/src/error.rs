// core/src/error.rs
use thiserror::Error;

/// Errors produced by the engine itself, as opposed to errors returned by
/// the handlers a pipeline runs.
///
/// A pipeline's own error type `E` must be `From<FlowError>` so that engine
/// failures surface through the same `Result` as handler failures.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No pipeline registered for context type {context_type}")]
  NotRegistered { context_type: String },

  #[error("Context type mismatch during dispatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Handler failed. Source: {source}")]
  HandlerError {
    #[source]
    source: anyhow::Error,
  },
}

impl From<anyhow::Error> for FlowError {
  fn from(source: anyhow::Error) -> Self {
    FlowError::HandlerError { source }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
