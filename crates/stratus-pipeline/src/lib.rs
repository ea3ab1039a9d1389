//! Stratus pipelines
//!
//! A pipeline chains built functions into a state-machine workflow. The
//! execution order is always explicit; the step mapping only names the
//! functions available to it.

pub mod compose;
pub mod error;

pub use compose::{
    CALLBACK_ERROR_PATH, LAMBDA_INVOKE_RESOURCE, Pipeline, PipelineSteps, TaskState,
    WorkflowCompiler, WorkflowDefinition, WorkflowHandle,
};
pub use error::PipelineError;
