//! Demo stacks.
//!
//! - `builder`: functions defined with the incremental builders
//! - `constructor`: the same set defined with all-in-constructor props
//! - `pipeline`: a knowledge-graph ingestion workflow

pub mod builder;
pub mod constructor;
pub mod pipeline;

use anyhow::Result;
use clap::ValueEnum;
use stratus_core::{DeploymentTarget, Environment, SourceLayout, prefixed_name};
use stratus_synth::{Template, TemplateCompiler};

/// Layer providing cached access to parameters and secrets.
pub const PARAMETERS_SECRETS_LAYER_ARN: &str =
    "arn:aws:lambda:us-east-1:177933569100:layer:AWS-Parameters-and-Secrets-Lambda-Extension:12";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StackKind {
    Builder,
    Constructor,
    Pipeline,
    All,
}

impl StackKind {
    pub fn expand(self) -> Vec<StackKind> {
        match self {
            StackKind::All => vec![StackKind::Builder, StackKind::Constructor, StackKind::Pipeline],
            kind => vec![kind],
        }
    }

    /// Construct id of the stack; also names its template file.
    pub fn stack_id(self) -> &'static str {
        match self {
            StackKind::Builder => "BuilderPatternStack",
            StackKind::Constructor => "ConstructorStack",
            StackKind::Pipeline => "PipelineStack",
            StackKind::All => "All",
        }
    }

    /// Base of the deployed stack name.
    fn stack_base_name(self) -> &'static str {
        match self {
            StackKind::Builder => "stack-with-builder-pattern",
            StackKind::Constructor => "stack-with-constructors",
            StackKind::Pipeline => "stack-with-pipeline",
            StackKind::All => "all",
        }
    }
}

/// Everything a stack definition depends on.
#[derive(Debug, Clone)]
pub struct StackContext {
    pub environment: Environment,
    pub target: DeploymentTarget,
    pub layout: SourceLayout,
}

impl StackContext {
    /// Deployed name of the stack.
    pub fn stack_name(&self, kind: StackKind) -> String {
        prefixed_name(kind.stack_base_name(), &self.environment)
    }

    fn compiler(&self, kind: StackKind) -> TemplateCompiler {
        let stack_name = self.stack_name(kind);
        TemplateCompiler::new(kind.stack_id())
            .with_tags(self.target.stack_tags(&self.environment, &stack_name))
            .with_target(&self.target)
            .with_description(stack_name)
    }
}

/// Synthesize one stack.
pub fn synthesize(kind: StackKind, ctx: &StackContext) -> Result<Template> {
    let mut compiler = ctx.compiler(kind);
    match kind {
        StackKind::Builder => builder::define(&mut compiler, ctx)?,
        StackKind::Constructor => constructor::define(&mut compiler, ctx)?,
        StackKind::Pipeline => pipeline::define(&mut compiler, ctx)?,
        StackKind::All => anyhow::bail!("'all' must be expanded before synthesis"),
    }
    tracing::info!(
        stack = kind.stack_id(),
        stack_name = %ctx.stack_name(kind),
        environment = %ctx.environment.env_name,
        "Defined stack"
    );
    Ok(compiler.into_template())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use stratus_core::EnvironmentRegistry;

    pub fn dev_context() -> StackContext {
        let registry = EnvironmentRegistry::builtin();
        StackContext {
            environment: registry.get("dev").unwrap().clone(),
            target: DeploymentTarget::default(),
            layout: SourceLayout::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_all() {
        assert_eq!(StackKind::All.expand().len(), 3);
        assert_eq!(StackKind::Pipeline.expand(), vec![StackKind::Pipeline]);
    }

    #[test]
    fn test_stack_names() {
        let ctx = test_support::dev_context();
        assert_eq!(
            ctx.stack_name(StackKind::Builder),
            "wizeline-olympic-games-kb-dev-stack-with-builder-pattern"
        );
        assert_eq!(
            ctx.stack_name(StackKind::Constructor),
            "wizeline-olympic-games-kb-dev-stack-with-constructors"
        );
    }

    #[test]
    fn test_stack_tags() {
        let mut ctx = test_support::dev_context();
        ctx.target.owner = Some("data-team".to_string());
        let template = synthesize(StackKind::Builder, &ctx).unwrap();
        let tags = &template.resources["BuilderSimpleGoLambdaFunction"].properties["Tags"];
        let keys: Vec<&str> = tags
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["Key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["APP", "OWNER", "STACK"]);
    }

    #[test]
    fn test_target_account_and_region_reach_template() {
        let mut ctx = test_support::dev_context();
        ctx.target.account = Some("111111111111".to_string());
        ctx.target.region = Some("us-west-2".to_string());

        for kind in StackKind::All.expand() {
            let value = synthesize(kind, &ctx).unwrap().to_value().unwrap();
            let target = &value["Metadata"][stratus_synth::TARGET_METADATA_KEY];
            assert_eq!(target["Account"], "111111111111");
            assert_eq!(target["Region"], "us-west-2");
        }

        let untargeted = synthesize(StackKind::Pipeline, &test_support::dev_context()).unwrap();
        assert!(untargeted.metadata.is_none());
    }
}
