// core/src/lib.rs

//! storeflow: a small async step engine for storefront workflows.
//!
//! A workflow is a `Pipeline<T, E>`: an ordered list of named steps over a
//! shared `ContextData<T>`. Each step carries `before`, `on` and `after`
//! handlers, may be optional, and may be skipped by a condition evaluated
//! against the context. Any handler can stop the run early.
//!
//! Typical use:
//!  1. Define a context struct for the operation.
//!  2. Build a `Pipeline` with its step names and attach async handlers.
//!  3. Register it in a `Flows<E>` registry.
//!  4. Call `flows.run(ContextData::new(ctx)).await` and read results back
//!     out of the context.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::{Handler, Phase};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::definition::Pipeline;
pub use crate::registry::Flows;
