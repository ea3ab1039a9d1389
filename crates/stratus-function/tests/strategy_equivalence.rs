//! Both construction strategies lower to the same descriptor.

use std::time::Duration;

use stratus_core::{Environment, EnvironmentName, Region};
use stratus_function::{
    Binding, BuildError, CompilerError, ConstructProps, ExportValue, FunctionConstruct,
    FunctionDescriptor, FunctionHandle, FunctionProps, PythonFunctionBuilder, PythonProps,
    ResourceAttribute, ResourceGraphCompiler, Scope,
};
use stratus_policy::{LayerRef, ManagedPolicyRef, SecretRef};

#[derive(Default)]
struct Recorder {
    functions: Vec<FunctionDescriptor>,
}

impl ResourceGraphCompiler for Recorder {
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

/// Compiler that refuses every function as already taken.
struct Occupied;

impl ResourceGraphCompiler for Occupied {
    fn materialize_function(
        &mut self,
        descriptor: &FunctionDescriptor,
    ) -> Result<FunctionHandle, CompilerError> {
        Err(CompilerError::DuplicateFunction(descriptor.function_name.clone()))
    }

    fn declare_secret(
        &mut self,
        _scope: &Scope,
        secret_name: &str,
    ) -> Result<SecretRef, CompilerError> {
        Err(CompilerError::DuplicateLogicalId(secret_name.to_string()))
    }

    fn import_layer(&mut self, _scope: &Scope, arn: &str) -> Result<LayerRef, CompilerError> {
        Err(CompilerError::InvalidReference(arn.to_string()))
    }

    fn export(
        &mut self,
        _scope: &Scope,
        name: &str,
        _value: ExportValue,
    ) -> Result<(), CompilerError> {
        Err(CompilerError::DuplicateExport(name.to_string()))
    }
}

fn env() -> Environment {
    Environment::new("Wizeline", "olympic-games-kb", EnvironmentName::Dev, Region::UsEast1)
}

#[test]
fn test_builder_and_constructor_are_equivalent() {
    let secret = SecretRef::named("wizeline-olympic-games-kb-dev-shared");
    let layer = LayerRef::from_arn(concat!(
        "arn:aws:lambda:us-east-1:177933569100:",
        "layer:AWS-Parameters-and-Secrets-Lambda-Extension:12",
    ))
    .unwrap();

    let mut builder_compiler = Recorder::default();
    let props = FunctionProps::new("complex", &env());
    PythonFunctionBuilder::new(Scope::root("A").child("Fn"), props)
        .with_log_group()
        .with_entry("dummy-python-lambda")
        .with_index("index.py")
        .with_duration(Duration::from_secs(90))
        .with_secret(&secret, Some("SECRET_NAME"))
        .with_layers([layer.clone()])
        .with_managed_policy(ManagedPolicyRef::aws_managed("AmazonBedrockFullAccess"))
        .with_managed_policy(ManagedPolicyRef::aws_managed("AmazonS3FullAccess"))
        .build(&mut builder_compiler)
        .unwrap();

    let mut props = ConstructProps::new("complex", &env());
    props.with_log_group = true;
    props.duration = Some(Duration::from_secs(90));
    props.secrets = vec![Binding::as_variable(secret.clone(), "SECRET_NAME")];
    props.layers = vec![layer];
    props.managed_policies = vec![
        ManagedPolicyRef::aws_managed("AmazonBedrockFullAccess"),
        ManagedPolicyRef::aws_managed("AmazonS3FullAccess"),
    ];
    let source = PythonProps {
        path: Some("dummy-python-lambda".to_string()),
        index: Some("index.py".to_string()),
        handler: None,
    };

    let mut constructor_compiler = Recorder::default();
    FunctionConstruct::new(
        &mut constructor_compiler,
        Scope::root("B").child("Fn"),
        props,
        source,
    )
    .unwrap();

    let a = &builder_compiler.functions[0];
    let b = &constructor_compiler.functions[0];
    assert_eq!(a.function_name, "wizeline-olympic-games-kb-dev-complex");
    assert_eq!(a.function_name, b.function_name);
    assert_eq!(a.environment_variables, b.environment_variables);
    assert_eq!(a.role, b.role);
    assert_eq!(a.source, b.source);
    assert_eq!(a.log_group, b.log_group);
    assert_eq!(a.layers, b.layers);
    assert_eq!(a.limits, b.limits);
}

#[test]
fn test_build_propagates_compiler_errors() {
    let scope = Scope::root("S").child("Fn");
    let err = PythonFunctionBuilder::new(scope.clone(), FunctionProps::new("f", &env()))
        .build(&mut Occupied)
        .unwrap_err();
    assert!(matches!(
        &err,
        BuildError::Compiler(CompilerError::DuplicateFunction(name))
            if name == "wizeline-olympic-games-kb-dev-f"
    ));
    assert_eq!(
        err.to_string(),
        "Function 'wizeline-olympic-games-kb-dev-f' was already materialized"
    );

    let err = FunctionConstruct::new(
        &mut Occupied,
        scope,
        ConstructProps::new("f", &env()),
        PythonProps::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::Compiler(CompilerError::DuplicateFunction(_))));
}
