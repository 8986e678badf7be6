// core/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct and its construction.

use crate::core::context::{Handler, Phase};
use crate::core::step::{SkipCondition, StepDef};
use crate::error::FlowError;
use std::collections::HashMap;

/// Handlers attached to one step, grouped by phase.
pub(crate) struct StepHooks<TData: 'static + Send + Sync, Err> {
  pub(crate) before: Vec<Handler<TData, Err>>,
  pub(crate) on: Vec<Handler<TData, Err>>,
  pub(crate) after: Vec<Handler<TData, Err>>,
}

impl<TData: 'static + Send + Sync, Err> Default for StepHooks<TData, Err> {
  fn default() -> Self {
    Self {
      before: Vec::new(),
      on: Vec::new(),
      after: Vec::new(),
    }
  }
}

impl<TData: 'static + Send + Sync, Err> StepHooks<TData, Err> {
  pub(crate) fn phase(&self, phase: Phase) -> &[Handler<TData, Err>] {
    match phase {
      Phase::Before => &self.before,
      Phase::On => &self.on,
      Phase::After => &self.after,
    }
  }

  pub(crate) fn phase_mut(&mut self, phase: Phase) -> &mut Vec<Handler<TData, Err>> {
    match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.before.is_empty() && self.on.is_empty() && self.after.is_empty()
  }
}

/// An ordered list of named steps over a shared context `TData`.
///
/// Handlers return `Result<PipelineControl, Err>`. `Err` must accept
/// `FlowError` so that configuration problems found at run time (a required
/// step with no handlers, a handler attached to an unknown step) come back
/// through the same channel.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) hooks: HashMap<String, StepHooks<TData, Err>>,
  /// Step names handlers were attached to that no declared step carries.
  pub(crate) undeclared: Vec<String>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional, skip_if)` triples, run in the
  /// given order.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      steps,
      hooks: HashMap::new(),
      undeclared: Vec::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn has_step(&self, step_name: &str) -> bool {
    self.steps.iter().any(|s| s.name == step_name)
  }

  pub(crate) fn handlers(&self, step_name: &str, phase: Phase) -> &[Handler<TData, Err>] {
    match self.hooks.get(step_name) {
      Some(hooks) => hooks.phase(phase),
      None => &[],
    }
  }
}
