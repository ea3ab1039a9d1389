use thiserror::Error;

/// Errors raised while composing a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline '{0}' has no steps")]
    EmptyOrder(String),

    #[error("Step '{0}' is not in the step mapping")]
    UnknownStep(String),

    #[error("Step '{0}' appears more than once")]
    DuplicateStep(String),

    #[error("Callback step '{0}' is not in the step mapping")]
    MissingCallback(String),

    #[error("Callback step '{0}' must not be part of the execution order")]
    CallbackInOrder(String),
}
