//! `stratus check` command implementation.
//!
//! Validates synthesized templates against `schemas/Template.schema.json`.
//! The schema is compiled into the binary so validation works without
//! external files.

use anyhow::{Context, Result, bail};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE_SCHEMA: &str = include_str!("../../../../schemas/Template.schema.json");

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFinding {
    pub file: Option<PathBuf>,
    /// JSON pointer into the template, `(root)` for the document itself.
    pub location: String,
    pub message: String,
}

impl std::fmt::Display for CheckFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}: {}", file.display(), self.location, self.message),
            None => write!(f, "{}: {}", self.location, self.message),
        }
    }
}

/// Validate one template document.
pub fn validate_template(template: &JsonValue) -> Result<Vec<CheckFinding>> {
    let schema: JsonValue = serde_json::from_str(TEMPLATE_SCHEMA)
        .context("embedded template schema is not valid JSON")?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("embedded template schema does not compile: {}", e))?;

    let findings = validator
        .iter_errors(template)
        .map(|error| {
            let path = error.instance_path().to_string();
            CheckFinding {
                file: None,
                location: if path.is_empty() { "(root)".to_string() } else { path },
                message: error.to_string(),
            }
        })
        .collect();
    Ok(findings)
}

/// Validate a template file on disk.
pub fn check_file(path: &Path) -> Result<Vec<CheckFinding>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let template: JsonValue = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let mut findings = validate_template(&template)?;
    for finding in &mut findings {
        finding.file = Some(path.to_path_buf());
    }
    Ok(findings)
}

pub fn run(files: &[PathBuf]) -> Result<()> {
    let mut total = 0;
    for file in files {
        let findings = check_file(file)?;
        if findings.is_empty() {
            println!("✓ {}", file.display());
        }
        for finding in &findings {
            println!("✗ {}", finding);
        }
        total += findings.len();
    }

    if total > 0 {
        bail!("{} schema violation(s) in {} file(s)", total, files.len());
    }
    println!("All {} template(s) valid.", files.len());
    Ok(())
}
