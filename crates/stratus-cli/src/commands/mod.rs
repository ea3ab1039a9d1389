//! CLI command implementations for Stratus.

pub mod check;
pub mod environments;
pub mod names;
pub mod synth;

use std::path::Path;

use anyhow::{Context, Result};
use stratus_core::EnvironmentRegistry;

/// Registry from `path`, or the built-in one.
pub fn load_registry(path: Option<&Path>) -> Result<EnvironmentRegistry> {
    match path {
        Some(path) => EnvironmentRegistry::from_file(path)
            .with_context(|| format!("Failed to load environments from {}", path.display())),
        None => Ok(EnvironmentRegistry::builtin()),
    }
}
