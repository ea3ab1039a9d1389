//! Boundary to the resource-graph compiler.
//!
//! Descriptors are handed over fully validated. The compiler owns whatever
//! it materializes and returns opaque handles; nothing here inspects its
//! internal representation.

use thiserror::Error;

use stratus_core::ConfigError;
use stratus_policy::{LayerRef, SecretRef};

use crate::descriptor::{FunctionDescriptor, Scope};

/// An attribute of a materialized resource, resolved at deploy time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAttribute {
    pub logical_id: String,
    pub attribute: String,
}

impl ResourceAttribute {
    pub fn new(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            attribute: attribute.into(),
        }
    }
}

/// Handle on a materialized function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionHandle {
    pub function_name: String,
    /// Invocation address.
    pub function_arn: ResourceAttribute,
}

impl FunctionHandle {
    /// Value published by cross-stack exports.
    pub fn export_value(&self) -> ExportValue {
        ExportValue::Attribute(self.function_arn.clone())
    }
}

/// Value of a stack export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportValue {
    Literal(String),
    Attribute(ResourceAttribute),
}

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("Logical id '{0}' is already used in this stack")]
    DuplicateLogicalId(String),

    #[error("Function '{0}' was already materialized")]
    DuplicateFunction(String),

    #[error("Export name '{0}' is already used")]
    DuplicateExport(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

/// Errors raised while building a function.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compiler(#[from] CompilerError),
}

/// Turns descriptors into deployable resources.
pub trait ResourceGraphCompiler {
    fn materialize_function(
        &mut self,
        descriptor: &FunctionDescriptor,
    ) -> Result<FunctionHandle, CompilerError>;

    /// Declare a secret owned by the stack.
    fn declare_secret(
        &mut self,
        scope: &Scope,
        secret_name: &str,
    ) -> Result<SecretRef, CompilerError>;

    /// Reference an existing layer version.
    fn import_layer(&mut self, scope: &Scope, arn: &str) -> Result<LayerRef, CompilerError>;

    fn export(
        &mut self,
        scope: &Scope,
        export_name: &str,
        value: ExportValue,
    ) -> Result<(), CompilerError>;
}
