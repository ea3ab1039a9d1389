use thiserror::Error;

/// Errors raised while writing a synthesized template.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
