//! Static registry of deployment environments.
//!
//! The active environment is selected once per process from the `ENV_NAME`
//! variable. A registry can be the built-in one or loaded from a YAML file
//! keyed by environment name:
//!
//! ```yaml
//! dev:
//!   org_name: Wizeline
//!   env_name: dev
//!   app_name: olympic-games-kb
//!   region: us-east-1
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::environment::{Environment, EnvironmentName, Region};
use crate::error::ConfigError;

/// Process variable naming the active environment.
pub const ENV_NAME_VAR: &str = "ENV_NAME";

/// All environments known to the application.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentRegistry {
    environments: BTreeMap<EnvironmentName, Environment>,
}

impl EnvironmentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry compiled into the binary.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Environment {
            org_name: "Wizeline".to_string(),
            env_name: EnvironmentName::Dev,
            app_name: "olympic-games-kb".to_string(),
            region: Region::UsEast1,
            provisioned_concurrency_enabled: false,
        });
        // Add more environments here...
        registry
    }

    /// Add an environment, replacing any previous entry with the same name.
    pub fn register(&mut self, environment: Environment) -> Option<Environment> {
        self.environments.insert(environment.env_name, environment)
    }

    /// Load a registry from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a registry from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, Environment> = serde_yaml::from_str(content)?;

        let mut registry = Self::new();
        for (key, environment) in raw {
            let name: EnvironmentName = key.parse()?;
            if name != environment.env_name {
                return Err(ConfigError::Config(format!(
                    "registry key '{}' does not match env_name '{}'",
                    key, environment.env_name
                )));
            }
            registry.register(environment);
        }

        Ok(registry)
    }

    /// Look up an environment by its string name.
    pub fn get(&self, name: &str) -> Result<&Environment, ConfigError> {
        let name: EnvironmentName = name.parse()?;
        self.lookup(name)
    }

    /// Look up an environment by name.
    pub fn lookup(&self, name: EnvironmentName) -> Result<&Environment, ConfigError> {
        self.environments
            .get(&name)
            .ok_or_else(|| ConfigError::EnvironmentNotRegistered(name.to_string()))
    }

    /// Select the active environment from the value of [`ENV_NAME_VAR`].
    pub fn select(&self, value: Option<&str>) -> Result<&Environment, ConfigError> {
        let value = value.ok_or_else(|| ConfigError::MissingVariable(ENV_NAME_VAR.to_string()))?;
        let environment = self.get(value)?;
        tracing::debug!(
            env = %environment.env_name,
            app = %environment.app_name,
            "selected environment"
        );
        Ok(environment)
    }

    /// Select the active environment from the process environment.
    pub fn from_process_env(&self) -> Result<&Environment, ConfigError> {
        let value = std::env::var(ENV_NAME_VAR).ok();
        self.select(value.as_deref())
    }

    /// Registered environments in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &Environment> {
        self.environments.values()
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}
