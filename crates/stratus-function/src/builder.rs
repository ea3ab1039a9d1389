//! Incremental function builder.
//!
//! Configuration calls take the builder by value and return it, so they
//! chain. Every setter is last-write-wins except environment variables,
//! which accumulate. [`FunctionBuilder::build`] consumes the builder: once
//! built, a builder can neither be configured further nor built again.
//!
//! ```ignore
//! let handle = PythonFunctionBuilder::new(scope, FunctionProps::new("ingest", &env))
//!     .with_log_group()
//!     .with_duration(Duration::from_secs(90))
//!     .with_secret(&secret, Some("SECRET_NAME"))
//!     .build(&mut compiler)?;
//! ```

use std::time::Duration;

use stratus_core::{ConfigError, Environment, SourceLayout};
use stratus_policy::{
    BucketRef, FoundationModel, Grant, KnowledgeBaseAccess, LayerRef, ManagedPolicyRef,
    ModelAccess, PolicyStatement, QueueRef, SecretRef, TableRef,
};

use crate::compiler::{BuildError, FunctionHandle, ResourceGraphCompiler};
use crate::descriptor::{
    FunctionDescriptor, NetworkPlacement, Scope, SecurityGroupRef, SubnetSelection, VpcRef,
};
use crate::draft::FunctionDraft;
use crate::runtime::Runtime;
use crate::source::{GoDraft, NodeDraft, PythonDraft, RustDraft, SourceDraft};

pub type NodeFunctionBuilder = FunctionBuilder<NodeDraft>;
pub type PythonFunctionBuilder = FunctionBuilder<PythonDraft>;
pub type GoFunctionBuilder = FunctionBuilder<GoDraft>;
pub type RustFunctionBuilder = FunctionBuilder<RustDraft>;

/// Identity of a function: base name, target environment and source root.
#[derive(Debug, Clone)]
pub struct FunctionProps {
    pub name: String,
    pub environment: Environment,
    pub layout: SourceLayout,
}

impl FunctionProps {
    pub fn new(name: impl Into<String>, environment: &Environment) -> Self {
        Self {
            name: name.into(),
            environment: environment.clone(),
            layout: SourceLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: SourceLayout) -> Self {
        self.layout = layout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FunctionBuilder<S: SourceDraft> {
    draft: FunctionDraft<S>,
}

impl<S: SourceDraft> FunctionBuilder<S> {
    /// Start a builder with the runtime's source defaults applied.
    pub fn new(scope: Scope, props: FunctionProps) -> Self {
        Self {
            draft: FunctionDraft::new(scope, &props.name, &props.environment, props.layout, true),
        }
    }

    /// Start a builder with no source fields set.
    pub fn bare(scope: Scope, props: FunctionProps) -> Self {
        Self {
            draft: FunctionDraft::new(scope, &props.name, &props.environment, props.layout, false),
        }
    }

    /// Deployed name of the function.
    pub fn function_name(&self) -> &str {
        &self.draft.function_name
    }

    /// Give the function a dedicated log group.
    pub fn with_log_group(mut self) -> Self {
        self.draft.log_group = true;
        self
    }

    pub fn with_duration(mut self, timeout: Duration) -> Self {
        self.draft.limits.timeout = Some(timeout);
        self
    }

    pub fn with_memory_size(mut self, memory_size_mb: u32) -> Self {
        self.draft.limits.memory_size = Some(memory_size_mb);
        self
    }

    pub fn with_concurrency(mut self, reserved_concurrency: u32) -> Self {
        self.draft.limits.reserved_concurrency = Some(reserved_concurrency);
        self
    }

    /// Overlay `variables` on the ones already set.
    pub fn with_environment_variables<K, V>(
        mut self,
        variables: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.draft.merge_environment_variables(
            variables.into_iter().map(|(k, v)| (k.into(), v.into())),
        );
        self
    }

    pub fn with_environment_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.draft
            .environment_variables
            .insert(name.into(), value.into());
        self
    }

    /// Place the function in `vpc`. Subnets default to private with egress.
    pub fn with_vpc(
        mut self,
        vpc: VpcRef,
        security_groups: impl IntoIterator<Item = SecurityGroupRef>,
        subnets: Option<SubnetSelection>,
    ) -> Self {
        let placement = NetworkPlacement::new(vpc, security_groups.into_iter().collect())
            .with_subnets(subnets.unwrap_or_default());
        self.draft.network = Some(placement);
        self
    }

    /// Grant read access on `secret`, optionally exposing its name as `variable`.
    pub fn with_secret(mut self, secret: &SecretRef, variable: Option<&str>) -> Self {
        self.draft
            .bind(Grant::SecretRead(secret.clone()), variable, &secret.name);
        self
    }

    pub fn with_bucket(mut self, bucket: &BucketRef, variable: Option<&str>) -> Self {
        self.draft
            .bind(Grant::BucketReadWrite(bucket.clone()), variable, &bucket.name);
        self
    }

    pub fn with_queue(mut self, queue: &QueueRef, variable: Option<&str>) -> Self {
        self.draft
            .bind(Grant::QueueConsumeAndSend(queue.clone()), variable, &queue.name);
        self
    }

    pub fn with_table(mut self, table: &TableRef, variable: Option<&str>) -> Self {
        self.draft
            .bind(Grant::TableReadWriteData(table.clone()), variable, &table.name);
        self
    }

    pub fn with_managed_policy(mut self, policy: ManagedPolicyRef) -> Self {
        self.draft.add_managed_policy(policy);
        self
    }

    pub fn with_policy_statements(
        mut self,
        statements: impl IntoIterator<Item = PolicyStatement>,
    ) -> Self {
        self.draft.add_statements(statements);
        self
    }

    /// Allow invoking `models` with the default invoke actions.
    pub fn with_model_invocation(self, models: impl IntoIterator<Item = FoundationModel>) -> Self {
        self.with_model_access(ModelAccess {
            models: models.into_iter().collect(),
            actions: None,
        })
    }

    pub fn with_model_access(mut self, access: ModelAccess) -> Self {
        self.draft.permissions.set_models(access);
        self
    }

    /// Allow retrieval and ingestion on the given knowledge bases.
    pub fn with_knowledge_bases<I>(self, knowledge_base_ids: impl IntoIterator<Item = I>) -> Self
    where
        I: Into<String>,
    {
        self.with_knowledge_base_access(KnowledgeBaseAccess {
            knowledge_base_ids: knowledge_base_ids.into_iter().map(Into::into).collect(),
            actions: None,
        })
    }

    pub fn with_knowledge_base_access(mut self, access: KnowledgeBaseAccess) -> Self {
        self.draft.permissions.set_knowledge_bases(access);
        self
    }

    /// Replace the attached layers.
    pub fn with_layers(mut self, layers: impl IntoIterator<Item = LayerRef>) -> Self {
        self.draft.layers = layers.into_iter().collect();
        self
    }

    /// Fails when `runtime` belongs to another family.
    pub fn with_runtime(mut self, runtime: Runtime) -> Result<Self, ConfigError> {
        self.draft.set_runtime(runtime)?;
        Ok(self)
    }

    /// Validate and assemble the descriptor without materializing it.
    pub fn describe(&self) -> Result<FunctionDescriptor, ConfigError> {
        self.draft.finish()
    }

    /// Validate, then hand the descriptor to `compiler`.
    pub fn build<C>(self, compiler: &mut C) -> Result<FunctionHandle, BuildError>
    where
        C: ResourceGraphCompiler + ?Sized,
    {
        let descriptor = self.draft.finish()?;
        tracing::debug!(
            function = %descriptor.function_name,
            runtime = %descriptor.runtime,
            scope = %descriptor.scope,
            "Building function"
        );
        Ok(compiler.materialize_function(&descriptor)?)
    }
}

impl FunctionBuilder<NodeDraft> {
    /// Entry file `{root}/{dir}/index.ts`.
    pub fn with_entry(mut self, dir: &str) -> Self {
        self.draft.source.entry = Some(self.draft.layout.node_entry(dir));
        self
    }
}

impl FunctionBuilder<PythonDraft> {
    /// Entry directory `{root}/{dir}`.
    pub fn with_entry(mut self, dir: &str) -> Self {
        self.draft.source.entry = Some(self.draft.layout.python_entry(dir));
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.draft.source.index = Some(index.into());
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.draft.source.handler = Some(handler.into());
        self
    }
}

impl FunctionBuilder<GoDraft> {
    /// Entry file `{root}/{dir}/main.go`.
    pub fn with_entry(mut self, dir: &str) -> Self {
        self.draft.source.entry = Some(self.draft.layout.go_entry(dir));
        self
    }

    pub fn with_module_dir(mut self, dir: &str) -> Self {
        self.draft.source.module_dir = Some(self.draft.layout.go_module_dir(dir));
        self
    }
}

impl FunctionBuilder<RustDraft> {
    /// Manifest `{root}/{dir}/Cargo.toml`.
    pub fn with_manifest(mut self, dir: &str) -> Self {
        self.draft.source.manifest_path = Some(self.draft.layout.rust_manifest(dir));
        self
    }
}
