// core/src/pipeline/execution.rs

//! `Pipeline::run()`: walks the steps in order and drives each phase.

use crate::core::context::Phase;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::step::StepDef;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, instrument, Instrument, Level};

enum StepOutcome {
  Ran,
  Skipped,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes the pipeline against `ctx_data`.
  ///
  /// Per step: the skip condition is checked first, then `before`, `on` and
  /// `after` handlers run in registration order. The first handler error
  /// aborts the run and is returned unchanged.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    if let Some(step_name) = self.undeclared.first() {
      event!(Level::ERROR, step_name = %step_name, "Pipeline has handlers for an undeclared step.");
      return Err(Err::from(FlowError::StepNotFound {
        step_name: step_name.clone(),
      }));
    }

    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = info_span!(
        "pipeline_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
        optional = step_def.optional
      );
      match self.run_step(step_def, &ctx_data).instrument(step_span).await? {
        StepOutcome::Ran | StepOutcome::Skipped => {}
        StepOutcome::Stopped => return Ok(PipelineResult::Stopped),
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<StepOutcome, Err> {
    if let Some(skip_if) = &step_def.skip_if {
      let skip = {
        let guard = ctx_data.read();
        skip_if(&guard)
      };
      if skip {
        event!(Level::INFO, "Step skipped by its condition.");
        return Ok(StepOutcome::Skipped);
      }
    }

    let has_handlers = self.hooks.get(&step_def.name).map_or(false, |h| !h.is_empty());
    if !has_handlers {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(StepOutcome::Skipped);
      }
      event!(Level::ERROR, "Required step has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for phase in [Phase::Before, Phase::On, Phase::After] {
      if self.run_phase(&step_def.name, phase, ctx_data).await? == PipelineControl::Stop {
        event!(Level::INFO, phase = phase.as_str(), "Pipeline stopped by a handler.");
        return Ok(StepOutcome::Stopped);
      }
    }
    Ok(StepOutcome::Ran)
  }

  async fn run_phase(&self, step_name: &str, phase: Phase, ctx_data: &ContextData<TData>) -> Result<PipelineControl, Err> {
    for (handler_idx, handler) in self.handlers(step_name, phase).iter().enumerate() {
      match handler(ctx_data.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
        Err(e) => {
          event!(Level::ERROR, phase = phase.as_str(), handler_index = handler_idx, error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PipelineControl::Continue)
  }
}
