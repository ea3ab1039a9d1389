//! Configuration error type shared by every Stratus crate.

use thiserror::Error;

/// Errors raised while loading configuration or validating a definition.
///
/// Every variant is fatal: the definition run stops at the offending call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A required process environment variable is not set.
    #[error("Missing {0} environment variable")]
    MissingVariable(String),

    /// The environment name is outside the fixed enumeration.
    #[error("Unknown environment name '{0}' (expected one of: local, ci, dev, qa, stage, prod)")]
    UnknownEnvironment(String),

    /// The environment name is valid but the registry has no entry for it.
    #[error("No environment found for name: {0}")]
    EnvironmentNotRegistered(String),

    #[error("Unknown region '{0}' (expected one of: us-east-1, us-west-2)")]
    UnknownRegion(String),

    #[error("Unknown runtime '{0}'")]
    UnknownRuntime(String),

    /// A runtime of the wrong family was given to a runtime-specific definition.
    #[error("Expected a {expected} runtime to be given. Got {actual} instead.")]
    RuntimeMismatch { expected: String, actual: String },

    /// A mandatory field was not set before the definition was built.
    #[error("Expected {0} to be defined.")]
    MissingField(&'static str),

    /// A field was set to a value the provider would reject.
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConfigError {
    /// Build an [`ConfigError::Invalid`] error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the field this error is about, when it is about one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field) => Some(*field),
            Self::Invalid { field, .. } => Some(*field),
            _ => None,
        }
    }
}
