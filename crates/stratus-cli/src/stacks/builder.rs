//! Stack defined with the incremental builders.

use std::time::Duration;

use anyhow::{Context, Result};
use stratus_core::prefixed_name;
use stratus_function::{
    FunctionProps, GoFunctionBuilder, NodeFunctionBuilder, PythonFunctionBuilder,
    ResourceGraphCompiler, RustFunctionBuilder,
};
use stratus_policy::ManagedPolicyRef;
use stratus_synth::TemplateCompiler;

use super::{PARAMETERS_SECRETS_LAYER_ARN, StackContext};

pub fn define(compiler: &mut TemplateCompiler, ctx: &StackContext) -> Result<()> {
    let env = &ctx.environment;
    let root = compiler.scope();
    let props = |name: &str| FunctionProps::new(name, env).with_layout(ctx.layout.clone());

    let secret = compiler
        .declare_secret(
            &root.child(format!("Secret{}", compiler.stack_name())),
            &prefixed_name("builder-pattern-secret", env),
        )
        .context("declaring the shared secret")?;

    let layer = compiler.import_layer(
        &root.child("ParametersSecretsLayer"),
        PARAMETERS_SECRETS_LAYER_ARN,
    )?;

    let simple_python = PythonFunctionBuilder::new(
        root.child("BuilderSimplePythonLambda"),
        props("dummy-python-lambda"),
    )
    .build(compiler)?;

    let complex_python = PythonFunctionBuilder::new(
        root.child("BuilderComplexPythonLambda"),
        props("complex-builder-python"),
    )
    .with_log_group()
    .with_entry("dummy-python-lambda")
    .with_index("index.py")
    .with_handler("handler")
    .with_duration(Duration::from_secs(90))
    .with_secret(&secret, Some("SECRET_NAME"))
    .with_layers([layer.clone()])
    .with_managed_policy(ManagedPolicyRef::aws_managed("AmazonBedrockFullAccess"))
    .with_managed_policy(ManagedPolicyRef::aws_managed("AmazonS3FullAccess"))
    .build(compiler)?;

    let simple_rust = RustFunctionBuilder::new(
        root.child("BuilderSimpleRustLambda"),
        props("dummy-rust-lambda"),
    )
    .build(compiler)?;

    let complex_rust = RustFunctionBuilder::new(
        root.child("BuilderComplexRustLambda"),
        props("complex-rust-lambda"),
    )
    .with_manifest("dummy-rust-lambda")
    .with_log_group()
    .with_duration(Duration::from_secs(90))
    .with_secret(&secret, Some("SECRET_NAME"))
    .with_layers([layer])
    .with_managed_policy(ManagedPolicyRef::aws_managed("AmazonBedrockFullAccess"))
    .with_managed_policy(ManagedPolicyRef::aws_managed("AmazonS3FullAccess"))
    .build(compiler)?;

    let simple_go =
        GoFunctionBuilder::new(root.child("BuilderSimpleGoLambda"), props("dummy-go-lambda"))
            .build(compiler)?;

    let simple_node = NodeFunctionBuilder::new(
        root.child("BuilderSimpleNodejsLambda"),
        props("dummy-nodejs-lambda"),
    )
    .build(compiler)?;

    let exports = [
        ("BuilderSimplePythonLambdaARN", "builder-simple-python-lambda-arn", &simple_python),
        ("BuilderComplexPythonLambdaARN", "builder-complex-python-lambda-arn", &complex_python),
        ("BuilderSimpleRustLambdaARN", "builder-simple-rust-lambda-arn", &simple_rust),
        ("BuilderComplexRustLambdaARN", "builder-complex-rust-lambda-arn", &complex_rust),
        ("BuilderSimpleGoLambdaARN", "builder-simple-go-lambda-arn", &simple_go),
        ("BuilderSimpleNodejsLambdaARN", "builder-simple-nodejs-lambda-arn", &simple_node),
    ];
    for (id, export_name, handle) in exports {
        compiler.export(&root.child(id), &prefixed_name(export_name, env), handle.export_value())?;
    }

    Ok(())
}
