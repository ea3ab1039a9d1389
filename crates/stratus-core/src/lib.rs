//! Shared configuration types for Stratus.
//!
//! - [`environment`]: deployment environment model
//! - [`registry`]: static environment registry, selected by `ENV_NAME`
//! - [`naming`]: prefixed resource names and parameter-store paths
//! - [`target`]: optional account / region / owner variables
//! - [`layout`]: per-runtime source-layout conventions

pub mod environment;
pub mod error;
pub mod layout;
pub mod naming;
pub mod registry;
pub mod target;

pub use environment::{Environment, EnvironmentName, Region};
pub use error::ConfigError;
pub use layout::SourceLayout;
pub use naming::{parameter_path, prefixed_name};
pub use registry::{ENV_NAME_VAR, EnvironmentRegistry};
pub use target::DeploymentTarget;
