//! Knowledge-graph ingestion pipeline.
//!
//! generate-definitions -> prepare-store -> build-graph -> embed ->
//! search-relationships, with every failure routed to `callback`.

use std::time::Duration;

use anyhow::{Context, Result};
use stratus_core::prefixed_name;
use stratus_function::{ExportValue, FunctionProps, PythonFunctionBuilder, ResourceGraphCompiler};
use stratus_pipeline::{Pipeline, PipelineSteps, WorkflowCompiler};
use stratus_policy::FoundationModel;
use stratus_synth::TemplateCompiler;

use super::StackContext;

pub const STEP_ORDER: [&str; 5] = [
    "generate-definitions",
    "prepare-store",
    "build-graph",
    "embed",
    "search-relationships",
];

pub const CALLBACK_STEP: &str = "callback";

pub fn define(compiler: &mut TemplateCompiler, ctx: &StackContext) -> Result<()> {
    let env = &ctx.environment;
    let root = compiler.scope();
    let props = |name: &str| FunctionProps::new(name, env).with_layout(ctx.layout.clone());

    let secret = compiler.declare_secret(
        &root.child("GraphStoreSecret"),
        &prefixed_name("graph-store-secret", env),
    )?;

    let mut steps = PipelineSteps::new();
    for &step in STEP_ORDER.iter().chain(&[CALLBACK_STEP]) {
        let mut builder = PythonFunctionBuilder::new(root.child(step_id(step)), props(step))
            .with_log_group()
            .with_duration(Duration::from_secs(300));

        builder = match step {
            "prepare-store" | "build-graph" | "search-relationships" => {
                builder.with_secret(&secret, Some("GRAPH_STORE_SECRET_NAME"))
            }
            "embed" => builder
                .with_memory_size(1024)
                .with_model_invocation([FoundationModel::new(
                    FoundationModel::AMAZON_TITAN_EMBED_TEXT_V2,
                )]),
            "generate-definitions" => builder.with_model_invocation([FoundationModel::new(
                FoundationModel::ANTHROPIC_CLAUDE_3_5_SONNET,
            )]),
            _ => builder,
        };

        let handle = builder.build(compiler)?;
        steps.insert(step, handle)?;
    }

    let pipeline_name = prefixed_name("pipeline", env);
    let definition = Pipeline::compose(&pipeline_name, &steps, &STEP_ORDER, CALLBACK_STEP)
        .context("composing the ingestion pipeline")?;
    let workflow = compiler.materialize_workflow(&root.child("Pipeline"), &definition)?;

    compiler.export(
        &root.child("PipelineStateMachineARN"),
        &prefixed_name("pipeline-state-machine-arn", env),
        ExportValue::Attribute(workflow.state_machine_arn),
    )?;

    Ok(())
}

/// `build-graph` -> `BuildGraphLambda`
fn step_id(step: &str) -> String {
    let mut id: String = step
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    id.push_str("Lambda");
    id
}
