//! Stack defined with all-in-constructor props.

use std::time::Duration;

use anyhow::{Context, Result};
use stratus_core::prefixed_name;
use stratus_function::{
    Binding, ConstructProps, FunctionConstruct, GoProps, NodeProps, PythonProps,
    ResourceGraphCompiler, RustProps,
};
use stratus_policy::ManagedPolicyRef;
use stratus_synth::TemplateCompiler;

use super::{PARAMETERS_SECRETS_LAYER_ARN, StackContext};

fn path(dir: &str) -> Option<String> {
    Some(dir.to_string())
}

pub fn define(compiler: &mut TemplateCompiler, ctx: &StackContext) -> Result<()> {
    let env = &ctx.environment;
    let root = compiler.scope();
    let props = |name: &str| {
        let mut props = ConstructProps::new(name, env);
        props.layout = ctx.layout.clone();
        props
    };

    let secret = compiler
        .declare_secret(
            &root.child(format!("Secret{}", compiler.stack_name())),
            &prefixed_name("constructor-pattern-secret", env),
        )
        .context("declaring the shared secret")?;

    let layer = compiler.import_layer(
        &root.child("ParametersSecretsLayer"),
        PARAMETERS_SECRETS_LAYER_ARN,
    )?;

    let simple_python = FunctionConstruct::new(
        compiler,
        root.child("SimpleConstructorPythonLambda"),
        props("dummy-constructor-python-lambda"),
        PythonProps {
            path: path("dummy-python-lambda"),
            ..Default::default()
        },
    )?;

    let mut complex = props("complex-constructor-python-lambda");
    complex.with_log_group = true;
    complex.secrets = vec![Binding::as_variable(secret, "SECRET_NAME")];
    complex.layers = vec![layer];
    complex.duration = Some(Duration::from_secs(90));
    complex.managed_policies = vec![
        ManagedPolicyRef::aws_managed("AmazonBedrockFullAccess"),
        ManagedPolicyRef::aws_managed("AmazonS3FullAccess"),
    ];
    let complex_python = FunctionConstruct::new(
        compiler,
        root.child("ComplexConstructorPythonLambda"),
        complex,
        PythonProps {
            path: path("dummy-python-lambda"),
            ..Default::default()
        },
    )?;

    let simple_rust = FunctionConstruct::new(
        compiler,
        root.child("ConstructorSimpleRustLambda"),
        props("dummy-constructor-rust-lambda"),
        RustProps {
            path: path("dummy-rust-lambda"),
        },
    )?;

    let simple_go = FunctionConstruct::new(
        compiler,
        root.child("ConstructorSimpleGoLambda"),
        props("dummy-constructor-go-lambda"),
        GoProps {
            path: path("dummy-go-lambda"),
        },
    )?;

    let simple_node = FunctionConstruct::new(
        compiler,
        root.child("ConstructorSimpleNodejsLambda"),
        props("dummy-constructor-nodejs-lambda"),
        NodeProps {
            path: path("dummy-nodejs-lambda"),
        },
    )?;

    let exports = [
        (
            "SimpleConstructorPythonLambdaARN",
            "constructor-simple-python-lambda-arn",
            &simple_python,
        ),
        (
            "ConstructorComplexPythonLambdaARN",
            "constructor-complex-python-lambda-arn",
            &complex_python,
        ),
        ("ConstructorSimpleRustLambdaARN", "constructor-simple-rust-lambda-arn", &simple_rust),
        ("ConstructorSimpleGoLambdaARN", "constructor-simple-go-lambda-arn", &simple_go),
        ("ConstructorSimpleNodejsLambdaARN", "constructor-simple-nodejs-lambda-arn", &simple_node),
    ];
    for (id, export_name, construct) in exports {
        compiler.export(
            &root.child(id),
            &prefixed_name(export_name, env),
            construct.handle().export_value(),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacks::test_support::dev_context;
    use crate::stacks::{StackKind, synthesize};

    #[test]
    fn test_constructor_stack() {
        let template = synthesize(StackKind::Constructor, &dev_context()).unwrap();

        assert_eq!(template.resources_of_type("AWS::Lambda::Function").count(), 5);
        assert_eq!(template.resources_of_type("AWS::Logs::LogGroup").count(), 1);
        assert_eq!(template.outputs.len(), 5);

        let go = &template.resources["ConstructorSimpleGoLambdaFunction"];
        assert_eq!(
            go.properties["FunctionName"],
            "wizeline-olympic-games-kb-dev-dummy-constructor-go-lambda"
        );
        assert_eq!(go.metadata.as_ref().unwrap()["aws:asset:path"], "src/lambda/dummy-go-lambda");

        let role = &template.resources["ComplexConstructorPythonLambdaRole"].properties;
        assert_eq!(role["ManagedPolicyArns"].as_array().unwrap().len(), 3);
        let statements = role["Policies"][0]["PolicyDocument"]["Statement"].as_array().unwrap();
        // 2 defaults + the secret grant
        assert_eq!(statements.len(), 3);
    }

    #[test]
    fn test_complex_functions_match_across_strategies() {
        let ctx = dev_context();
        let builder = synthesize(StackKind::Builder, &ctx).unwrap();
        let constructor = synthesize(StackKind::Constructor, &ctx).unwrap();

        let a = &builder.resources["BuilderComplexPythonLambdaRole"].properties;
        let b = &constructor.resources["ComplexConstructorPythonLambdaRole"].properties;
        assert_eq!(a["ManagedPolicyArns"], b["ManagedPolicyArns"]);
        assert_eq!(
            a["Policies"][0]["PolicyDocument"]["Statement"].as_array().unwrap().len(),
            b["Policies"][0]["PolicyDocument"]["Statement"].as_array().unwrap().len()
        );

        let a = &builder.resources["BuilderComplexPythonLambdaFunction"].properties;
        let b = &constructor.resources["ComplexConstructorPythonLambdaFunction"].properties;
        assert_eq!(a["Handler"], b["Handler"]);
        assert_eq!(a["Timeout"], b["Timeout"]);
        assert_eq!(a["Layers"], b["Layers"]);
    }
}
