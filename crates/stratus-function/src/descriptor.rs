//! The immutable function descriptor handed to the resource-graph compiler.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use stratus_policy::{ExecutionRole, LayerRef};

use crate::runtime::Runtime;
use crate::source::FunctionSource;

/// Log retention applied to function log groups.
pub const LOG_RETENTION_DAYS: u32 = 7;

/// Opaque position of a definition in the compiler's construct tree.
///
/// Descriptors carry it through unchanged; only the compiler derives
/// identifiers from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    path: Vec<String>,
}

impl Scope {
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            path: vec![id.into()],
        }
    }

    pub fn child(&self, id: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(id.into());
        Self { path }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Innermost identifier.
    pub fn id(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VpcRef {
    pub vpc_id: String,
}

impl VpcRef {
    pub fn new(vpc_id: impl Into<String>) -> Self {
        Self { vpc_id: vpc_id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityGroupRef {
    pub group_id: String,
}

impl SecurityGroupRef {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
        }
    }
}

/// Which subnets of the network the function is placed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SubnetSelection {
    #[default]
    PrivateWithEgress,
    PrivateIsolated,
    Public,
    Subnets(Vec<String>),
}

impl SubnetSelection {
    pub fn subnet_type(&self) -> Option<&'static str> {
        match self {
            SubnetSelection::PrivateWithEgress => Some("PRIVATE_WITH_EGRESS"),
            SubnetSelection::PrivateIsolated => Some("PRIVATE_ISOLATED"),
            SubnetSelection::Public => Some("PUBLIC"),
            SubnetSelection::Subnets(_) => None,
        }
    }
}

/// Network placement. The three parts are only ever set together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPlacement {
    pub vpc: VpcRef,
    pub subnets: SubnetSelection,
    pub security_groups: Vec<SecurityGroupRef>,
}

impl NetworkPlacement {
    pub fn new(vpc: VpcRef, security_groups: Vec<SecurityGroupRef>) -> Self {
        Self {
            vpc,
            subnets: SubnetSelection::default(),
            security_groups,
        }
    }

    pub fn with_subnets(mut self, subnets: SubnetSelection) -> Self {
        self.subnets = subnets;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalPolicy {
    #[default]
    Destroy,
    Retain,
}

/// Dedicated log group of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupSpec {
    pub name: String,
    pub retention_days: u32,
    pub removal_policy: RemovalPolicy,
}

impl LogGroupSpec {
    pub fn for_function(function_name: &str) -> Self {
        Self {
            name: format!("/aws/lambda/{}", function_name),
            retention_days: LOG_RETENTION_DAYS,
            removal_policy: RemovalPolicy::Destroy,
        }
    }
}

/// Optional limits. Unset values fall back to provider defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    pub timeout: Option<Duration>,
    pub memory_size: Option<u32>,
    pub reserved_concurrency: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Architecture {
    #[default]
    Arm64,
    X86_64,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Arm64 => "arm64",
            Architecture::X86_64 => "x86_64",
        }
    }
}

/// Fully configured, validated function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub scope: Scope,
    /// Base name the deployed name is derived from.
    pub name: String,
    /// Deployed name, `{org}-{app}-{env}-{name}` lowercased.
    pub function_name: String,
    pub runtime: Runtime,
    pub architecture: Architecture,
    pub source: FunctionSource,
    pub limits: ResourceLimits,
    pub network: Option<NetworkPlacement>,
    pub environment_variables: BTreeMap<String, String>,
    pub layers: Vec<LayerRef>,
    pub role: ExecutionRole,
    pub log_group: Option<LogGroupSpec>,
}
