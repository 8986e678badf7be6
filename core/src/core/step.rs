// core/src/core/step.rs

use std::sync::Arc;

/// Evaluated against the context before a step runs; `true` skips the step.
pub type SkipCondition<T> = Arc<dyn Fn(&T) -> bool + Send + Sync + 'static>;

/// A declared step: its name, whether it may have no handlers, and an
/// optional skip condition.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
