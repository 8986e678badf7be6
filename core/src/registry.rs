// core/src/registry.rs

//! `Flows<E>`: pipelines keyed by their context type.
//!
//! An application registers one pipeline per context struct and later runs
//! whichever matches the `ContextData<T>` it hands in. Results come back with
//! the application's error type `E`.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[async_trait]
trait ErasedRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr>;
}

struct RegisteredPipeline<TData, PipeErr, AppErr>
where
  TData: 'static + Send + Sync,
  PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Arc<Pipeline<TData, PipeErr>>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, PipeErr, AppErr> ErasedRunner<AppErr> for RegisteredPipeline<TData, PipeErr, AppErr>
where
  TData: 'static + Send + Sync,
  PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<PipeErr> + From<FlowError> + Send + Sync + 'static,
{
  #[instrument(
    name = "Flows::dispatch",
    skip_all,
    fields(context_type = %std::any::type_name::<TData>()),
    err(Display)
  )]
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr> {
    let ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<ContextData<TData>>().to_string();
        event!(Level::ERROR, %expected_type, "Context object type mismatch.");
        return Err(AppErr::from(FlowError::TypeMismatch { expected_type }));
      }
    };
    self.pipeline.run(ctx_data).await.map_err(AppErr::from)
  }
}

/// Registry of pipelines keyed by context type.
pub struct Flows<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  registry: Mutex<HashMap<TypeId, Arc<dyn ErasedRunner<AppErr>>>>,
}

impl<AppErr> Default for Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> Flows<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      registry: Mutex::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for context type `TData`, replacing any earlier one.
  pub fn register<TData, PipeErr>(&self, pipeline: Pipeline<TData, PipeErr>)
  where
    TData: 'static + Send + Sync,
    PipeErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<PipeErr>,
  {
    event!(Level::DEBUG, context_type = %std::any::type_name::<TData>(), "Registering pipeline.");
    let runner = RegisteredPipeline::<TData, PipeErr, AppErr> {
      pipeline: Arc::new(pipeline),
      _app_err: PhantomData,
    };
    self.registry.lock().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static + Send + Sync>(&self) -> bool {
    self.registry.lock().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData`.
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = {
      let reg = self.registry.lock();
      reg.get(&TypeId::of::<TData>()).cloned()
    };
    let runner = runner.ok_or_else(|| {
      let context_type = std::any::type_name::<TData>().to_string();
      event!(Level::ERROR, %context_type, "No pipeline registered.");
      AppErr::from(FlowError::NotRegistered { context_type })
    })?;

    runner.run_erased(Box::new(ctx_data)).await
  }
}
