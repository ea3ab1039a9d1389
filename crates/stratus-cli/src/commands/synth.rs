//! `stratus synth` command implementation.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use super::check;
use crate::stacks::{self, StackContext, StackKind};

/// Synthesize `kind` into `out`, one `{StackId}.template.json` per stack.
///
/// Every template is synthesized and checked against the embedded schema
/// before any is written. When one stack fails, nothing is written.
pub fn synthesize_to(kind: StackKind, ctx: &StackContext, out: &Path) -> Result<Vec<PathBuf>> {
    let mut templates = Vec::new();
    for kind in kind.expand() {
        let template = stacks::synthesize(kind, ctx)
            .with_context(|| format!("Failed to synthesize {}", kind.stack_id()))?;

        let findings = check::validate_template(&template.to_value()?)?;
        if !findings.is_empty() {
            for finding in &findings {
                tracing::error!(stack = kind.stack_id(), "{}", finding);
            }
            bail!(
                "{} failed template validation with {} violation(s)",
                kind.stack_id(),
                findings.len()
            );
        }
        templates.push((kind, template));
    }

    let mut written = Vec::with_capacity(templates.len());
    for (kind, template) in &templates {
        written.push(template.write_to(out, kind.stack_id())?);
    }
    Ok(written)
}

pub fn run(kind: StackKind, ctx: &StackContext, out: &Path) -> Result<()> {
    let written = synthesize_to(kind, ctx, out)?;
    for path in &written {
        println!("✓ {}", path.display());
    }
    println!(
        "Synthesized {} stack(s) for environment '{}'.",
        written.len(),
        ctx.environment.env_name
    );
    Ok(())
}
