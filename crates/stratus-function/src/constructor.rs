//! All-in-constructor functions.
//!
//! Every field is supplied up front in [`ConstructProps`] plus one
//! runtime-specific source props value. [`FunctionConstruct::new`] validates
//! and materializes in one call; the returned value is already built.

use std::collections::BTreeMap;
use std::time::Duration;

use stratus_core::{Environment, SourceLayout};
use stratus_policy::{
    BucketRef, Grant, KnowledgeBaseAccess, LayerRef, ManagedPolicyRef, ModelAccess,
    PolicyStatement, QueueRef, SecretRef, TableRef,
};

use crate::compiler::{BuildError, FunctionHandle, ResourceGraphCompiler};
use crate::descriptor::{FunctionDescriptor, NetworkPlacement, Scope};
use crate::draft::FunctionDraft;
use crate::runtime::Runtime;
use crate::source::{GoDraft, NodeDraft, PythonDraft, RustDraft, SourceDraft};

/// A resource reference plus the variable its name is exposed as, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding<T> {
    pub resource: T,
    pub environment_variable: Option<String>,
}

impl<T> Binding<T> {
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            environment_variable: None,
        }
    }

    pub fn as_variable(resource: T, variable: impl Into<String>) -> Self {
        Self {
            resource,
            environment_variable: Some(variable.into()),
        }
    }
}

/// Runtime-independent configuration of a constructed function.
#[derive(Debug, Clone)]
pub struct ConstructProps {
    pub name: String,
    pub environment: Environment,
    pub layout: SourceLayout,
    pub with_log_group: bool,
    pub duration: Option<Duration>,
    pub memory_size: Option<u32>,
    pub concurrency: Option<u32>,
    pub environment_variables: BTreeMap<String, String>,
    pub network: Option<NetworkPlacement>,
    pub layers: Vec<LayerRef>,
    pub secrets: Vec<Binding<SecretRef>>,
    pub buckets: Vec<Binding<BucketRef>>,
    pub queues: Vec<Binding<QueueRef>>,
    pub tables: Vec<Binding<TableRef>>,
    pub managed_policies: Vec<ManagedPolicyRef>,
    pub policies: Vec<PolicyStatement>,
    pub foundation_models: Option<ModelAccess>,
    pub knowledge_bases: Option<KnowledgeBaseAccess>,
    /// Overrides the runtime family's default runtime.
    pub runtime: Option<Runtime>,
}

impl ConstructProps {
    /// Props with every optional field empty.
    pub fn new(name: impl Into<String>, environment: &Environment) -> Self {
        Self {
            name: name.into(),
            environment: environment.clone(),
            layout: SourceLayout::default(),
            with_log_group: false,
            duration: None,
            memory_size: None,
            concurrency: None,
            environment_variables: BTreeMap::new(),
            network: None,
            layers: Vec::new(),
            secrets: Vec::new(),
            buckets: Vec::new(),
            queues: Vec::new(),
            tables: Vec::new(),
            managed_policies: Vec::new(),
            policies: Vec::new(),
            foundation_models: None,
            knowledge_bases: None,
            runtime: None,
        }
    }
}

/// Source props of one runtime family.
pub trait SourceProps {
    type Draft: SourceDraft;

    fn into_draft(self, name: &str, layout: &SourceLayout) -> Self::Draft;
}

/// `path` defaults to the function name.
#[derive(Debug, Clone, Default)]
pub struct NodeProps {
    pub path: Option<String>,
}

impl SourceProps for NodeProps {
    type Draft = NodeDraft;

    fn into_draft(self, name: &str, layout: &SourceLayout) -> NodeDraft {
        NodeDraft::with_defaults(self.path.as_deref().unwrap_or(name), layout)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PythonProps {
    pub path: Option<String>,
    pub index: Option<String>,
    pub handler: Option<String>,
}

impl SourceProps for PythonProps {
    type Draft = PythonDraft;

    fn into_draft(self, name: &str, layout: &SourceLayout) -> PythonDraft {
        let mut draft = PythonDraft::with_defaults(self.path.as_deref().unwrap_or(name), layout);
        if self.index.is_some() {
            draft.index = self.index;
        }
        if self.handler.is_some() {
            draft.handler = self.handler;
        }
        draft
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoProps {
    pub path: Option<String>,
}

impl SourceProps for GoProps {
    type Draft = GoDraft;

    fn into_draft(self, name: &str, layout: &SourceLayout) -> GoDraft {
        GoDraft::with_defaults(self.path.as_deref().unwrap_or(name), layout)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RustProps {
    pub path: Option<String>,
}

impl SourceProps for RustProps {
    type Draft = RustDraft;

    fn into_draft(self, name: &str, layout: &SourceLayout) -> RustDraft {
        RustDraft::with_defaults(self.path.as_deref().unwrap_or(name), layout)
    }
}

/// A function materialized at construction time.
#[derive(Debug, Clone)]
pub struct FunctionConstruct {
    descriptor: FunctionDescriptor,
    handle: FunctionHandle,
}

impl FunctionConstruct {
    pub fn new<C, P>(
        compiler: &mut C,
        scope: Scope,
        props: ConstructProps,
        source: P,
    ) -> Result<Self, BuildError>
    where
        C: ResourceGraphCompiler + ?Sized,
        P: SourceProps,
    {
        let descriptor = Self::lower(scope, props, source)?.finish()?;
        tracing::debug!(
            function = %descriptor.function_name,
            runtime = %descriptor.runtime,
            scope = %descriptor.scope,
            "Constructing function"
        );
        let handle = compiler.materialize_function(&descriptor)?;
        Ok(Self { descriptor, handle })
    }

    fn lower<P: SourceProps>(
        scope: Scope,
        props: ConstructProps,
        source: P,
    ) -> Result<FunctionDraft<P::Draft>, BuildError> {
        let mut draft =
            FunctionDraft::new(scope, &props.name, &props.environment, props.layout.clone(), false);
        draft.source = source.into_draft(&props.name, &props.layout);

        if let Some(runtime) = props.runtime {
            draft.set_runtime(runtime)?;
        }

        draft.log_group = props.with_log_group;
        draft.limits.timeout = props.duration;
        draft.limits.memory_size = props.memory_size;
        draft.limits.reserved_concurrency = props.concurrency;
        draft.network = props.network;
        draft.layers = props.layers;
        draft.merge_environment_variables(props.environment_variables);

        for Binding { resource, environment_variable } in props.secrets {
            let value = resource.name.clone();
            draft.bind(Grant::SecretRead(resource), environment_variable.as_deref(), &value);
        }
        for Binding { resource, environment_variable } in props.buckets {
            let value = resource.name.clone();
            draft.bind(Grant::BucketReadWrite(resource), environment_variable.as_deref(), &value);
        }
        for Binding { resource, environment_variable } in props.tables {
            let value = resource.name.clone();
            let variable = environment_variable.as_deref();
            draft.bind(Grant::TableReadWriteData(resource), variable, &value);
        }
        for Binding { resource, environment_variable } in props.queues {
            let value = resource.name.clone();
            let variable = environment_variable.as_deref();
            draft.bind(Grant::QueueConsumeAndSend(resource), variable, &value);
        }

        for policy in props.managed_policies {
            draft.add_managed_policy(policy);
        }
        draft.add_statements(props.policies);
        if let Some(access) = props.foundation_models {
            draft.permissions.set_models(access);
        }
        if let Some(access) = props.knowledge_bases {
            draft.permissions.set_knowledge_bases(access);
        }

        Ok(draft)
    }

    pub fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    pub fn handle(&self) -> &FunctionHandle {
        &self.handle
    }

    pub fn function_name(&self) -> &str {
        &self.handle.function_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompilerError, ExportValue, ResourceAttribute};
    use crate::source::FunctionSource;
    use std::path::PathBuf;
    use stratus_core::{ConfigError, EnvironmentName, Region};

    #[derive(Default)]
    struct RecordingCompiler {
        functions: Vec<FunctionDescriptor>,
    }

    impl ResourceGraphCompiler for RecordingCompiler {
        fn materialize_function(
            &mut self,
            descriptor: &FunctionDescriptor,
        ) -> Result<FunctionHandle, CompilerError> {
            self.functions.push(descriptor.clone());
            Ok(FunctionHandle {
                function_name: descriptor.function_name.clone(),
                function_arn: ResourceAttribute::new(descriptor.scope.id(), "Arn"),
            })
        }

        fn declare_secret(
            &mut self,
            _scope: &Scope,
            secret_name: &str,
        ) -> Result<SecretRef, CompilerError> {
            Ok(SecretRef::named(secret_name))
        }

        fn import_layer(&mut self, _scope: &Scope, arn: &str) -> Result<LayerRef, CompilerError> {
            LayerRef::from_arn(arn).map_err(|e| CompilerError::InvalidReference(e.to_string()))
        }

        fn export(
            &mut self,
            _scope: &Scope,
            _name: &str,
            _value: ExportValue,
        ) -> Result<(), CompilerError> {
            Ok(())
        }
    }

    fn env() -> Environment {
        Environment::new("Acme", "kb", EnvironmentName::Dev, Region::UsEast1)
    }

    #[test]
    fn test_path_defaults_to_name() {
        let mut compiler = RecordingCompiler::default();
        let construct = FunctionConstruct::new(
            &mut compiler,
            Scope::root("Stack").child("Go"),
            ConstructProps::new("dummy-go-lambda", &env()),
            GoProps::default(),
        )
        .unwrap();

        assert_eq!(construct.function_name(), "acme-kb-dev-dummy-go-lambda");
        assert_eq!(
            construct.descriptor().source,
            FunctionSource::Go {
                entry: PathBuf::from("src/lambda/dummy-go-lambda/main.go"),
                module_dir: PathBuf::from("src/lambda/dummy-go-lambda"),
            }
        );
        assert_eq!(compiler.functions.len(), 1);
    }

    #[test]
    fn test_bindings_in_order() {
        let mut props = ConstructProps::new("worker", &env());
        props.environment_variables.insert("STAGE".to_string(), "dev".to_string());
        props.secrets = vec![Binding::as_variable(SecretRef::named("s"), "SECRET_NAME")];
        props.buckets = vec![Binding::as_variable(BucketRef::named("docs"), "BUCKET")];
        props.queues = vec![Binding::new(QueueRef::named("jobs"))];
        props.tables = vec![Binding::as_variable(TableRef::named("items"), "TABLE")];

        let mut compiler = RecordingCompiler::default();
        let construct = FunctionConstruct::new(
            &mut compiler,
            Scope::root("Stack").child("Worker"),
            props,
            RustProps::default(),
        )
        .unwrap();

        let descriptor = construct.descriptor();
        assert_eq!(descriptor.environment_variables.len(), 4);
        assert_eq!(descriptor.environment_variables["BUCKET"], "docs");
        assert_eq!(
            descriptor.role.grants,
            vec![
                Grant::SecretRead(SecretRef::named("s")),
                Grant::BucketReadWrite(BucketRef::named("docs")),
                Grant::TableReadWriteData(TableRef::named("items")),
                Grant::QueueConsumeAndSend(QueueRef::named("jobs")),
            ]
        );
    }

    #[test]
    fn test_runtime_override_is_checked() {
        let mut props = ConstructProps::new("f", &env());
        props.runtime = Some(Runtime::Python311);

        let mut compiler = RecordingCompiler::default();
        let err =
            FunctionConstruct::new(&mut compiler, Scope::root("S"), props, NodeProps::default())
                .unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::RuntimeMismatch { .. })));
        assert!(compiler.functions.is_empty());
    }

    #[test]
    fn test_invalid_props_never_reach_compiler() {
        let mut props = ConstructProps::new("f", &env());
        props.duration = Some(Duration::from_secs(0));

        let mut compiler = RecordingCompiler::default();
        let err =
            FunctionConstruct::new(&mut compiler, Scope::root("S"), props, PythonProps::default())
                .unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::Invalid { field: "duration", .. })));
        assert!(compiler.functions.is_empty());
    }
}
