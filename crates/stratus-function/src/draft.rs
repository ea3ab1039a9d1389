//! State shared by both construction strategies.
//!
//! The incremental builder and the all-in-constructor both lower their
//! input into a [`FunctionDraft`]; validation and role synthesis happen in
//! one place, so equivalent inputs always yield identical descriptors.

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use stratus_core::{ConfigError, Environment, SourceLayout, prefixed_name};
use stratus_policy::{
    ExecutionRole, Grant, LayerRef, ManagedPolicyRef, PolicyStatement, RolePermissions,
};

use crate::descriptor::{
    Architecture, FunctionDescriptor, LogGroupSpec, NetworkPlacement, ResourceLimits, Scope,
};
use crate::runtime::Runtime;
use crate::source::SourceDraft;

pub const MAX_TIMEOUT_SECS: u64 = 900;
pub const MIN_MEMORY_MB: u32 = 128;
pub const MAX_MEMORY_MB: u32 = 10_240;
pub const MAX_FUNCTION_NAME_LEN: usize = 64;

static BASE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("base name pattern compiles"));

static DEPLOYED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("deployed name pattern compiles"));

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("variable pattern compiles"));

#[derive(Debug, Clone)]
pub(crate) struct FunctionDraft<S: SourceDraft> {
    pub scope: Scope,
    pub name: String,
    pub function_name: String,
    pub layout: SourceLayout,
    pub runtime: Runtime,
    pub source: S,
    pub limits: ResourceLimits,
    pub network: Option<NetworkPlacement>,
    pub environment_variables: BTreeMap<String, String>,
    pub layers: Vec<LayerRef>,
    pub permissions: RolePermissions,
    pub log_group: bool,
}

impl<S: SourceDraft> FunctionDraft<S> {
    /// New draft; `defaults` pre-fills the source from the layout conventions.
    pub fn new(
        scope: Scope,
        name: &str,
        environment: &Environment,
        layout: SourceLayout,
        defaults: bool,
    ) -> Self {
        let source = if defaults {
            S::with_defaults(name, &layout)
        } else {
            S::default()
        };

        Self {
            scope,
            name: name.to_string(),
            function_name: prefixed_name(name, environment),
            layout,
            runtime: S::default_runtime(),
            source,
            limits: ResourceLimits::default(),
            network: None,
            environment_variables: BTreeMap::new(),
            layers: Vec::new(),
            permissions: RolePermissions::new(),
            log_group: false,
        }
    }

    pub fn set_runtime(&mut self, runtime: Runtime) -> Result<(), ConfigError> {
        runtime.check_family(S::FAMILY)?;
        self.runtime = runtime;
        Ok(())
    }

    /// Overlay variables; keys already present are overwritten, never removed.
    pub fn merge_environment_variables(
        &mut self,
        variables: impl IntoIterator<Item = (String, String)>,
    ) {
        self.environment_variables.extend(variables);
    }

    /// Record `grant` and optionally expose `value` as `variable`.
    pub fn bind(&mut self, grant: Grant, variable: Option<&str>, value: &str) {
        self.permissions.grant(grant);
        if let Some(variable) = variable {
            self.environment_variables
                .insert(variable.to_string(), value.to_string());
        }
    }

    pub fn add_managed_policy(&mut self, policy: ManagedPolicyRef) {
        self.permissions.add_managed_policy(policy);
    }

    pub fn add_statements(&mut self, statements: impl IntoIterator<Item = PolicyStatement>) {
        self.permissions.add_statements(statements);
    }

    /// Validate and assemble the descriptor.
    pub fn finish(&self) -> Result<FunctionDescriptor, ConfigError> {
        let source = self.source.finish()?;
        self.validate()?;

        let log_group = self
            .log_group
            .then(|| LogGroupSpec::for_function(&self.function_name));

        Ok(FunctionDescriptor {
            scope: self.scope.clone(),
            name: self.name.clone(),
            function_name: self.function_name.clone(),
            runtime: self.runtime,
            architecture: Architecture::Arm64,
            source,
            limits: self.limits,
            network: self.network.clone(),
            environment_variables: self.environment_variables.clone(),
            layers: self.layers.clone(),
            role: ExecutionRole::synthesize(&self.permissions),
            log_group,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !BASE_NAME.is_match(&self.name) {
            return Err(ConfigError::invalid(
                "name",
                format!(
                    "'{}' must be non-empty and use only letters, digits, '-' and '_'",
                    self.name
                ),
            ));
        }

        // The organization and application prefixes are not checked by the registry.
        if !DEPLOYED_NAME.is_match(&self.function_name) {
            return Err(ConfigError::invalid(
                "environment",
                format!(
                    "deployed name '{}' may only use lowercase letters, digits, '-' and '_'",
                    self.function_name
                ),
            ));
        }

        if self.function_name.len() > MAX_FUNCTION_NAME_LEN {
            return Err(ConfigError::invalid(
                "name",
                format!(
                    "deployed name '{}' is longer than {} characters",
                    self.function_name, MAX_FUNCTION_NAME_LEN
                ),
            ));
        }

        if let Some(timeout) = self.limits.timeout {
            if timeout < Duration::from_secs(1) || timeout > Duration::from_secs(MAX_TIMEOUT_SECS) {
                return Err(ConfigError::invalid(
                    "duration",
                    format!("{:?} is outside 1..={}s", timeout, MAX_TIMEOUT_SECS),
                ));
            }
            if timeout.subsec_nanos() != 0 {
                return Err(ConfigError::invalid(
                    "duration",
                    format!("{:?} must be a whole number of seconds", timeout),
                ));
            }
        }

        if let Some(memory) = self.limits.memory_size {
            if !(MIN_MEMORY_MB..=MAX_MEMORY_MB).contains(&memory) {
                return Err(ConfigError::invalid(
                    "memorySize",
                    format!("{} MB is outside {}..={} MB", memory, MIN_MEMORY_MB, MAX_MEMORY_MB),
                ));
            }
        }

        if let Some(key) = self
            .environment_variables
            .keys()
            .find(|key| !VARIABLE_NAME.is_match(key))
        {
            return Err(ConfigError::invalid(
                "environmentVariables",
                format!("'{}' is not a valid variable name", key),
            ));
        }

        if let Some(network) = &self.network {
            if network.security_groups.is_empty() {
                return Err(ConfigError::invalid(
                    "securityGroups",
                    "network placement needs at least one security group",
                ));
            }
        }

        Ok(())
    }
}
