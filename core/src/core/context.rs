// core/src/core/context.rs

//! The handler type every step phase stores.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A boxed asynchronous step handler.
///
/// It receives a clone of the run's `ContextData<T>` and resolves to a
/// `PipelineControl` or the pipeline's error type. Lock guards taken on the
/// context must be released before the handler awaits anything.
pub type Handler<T, Err> = Box<
  dyn Fn(ContextData<T>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>> + Send + Sync,
>;

/// The three phases a step's handlers are grouped into, run in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}
