//! Template document model and intrinsic-function helpers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Value, json};
use stratus_function::{ExportValue, ResourceAttribute};

use crate::error::SynthError;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// A synthesized stack template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: &'static str,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Metadata", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    #[serde(rename = "Parameters", skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,

    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,

    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new() -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION,
            ..Default::default()
        }
    }

    pub fn to_value(&self) -> Result<Value, SynthError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SynthError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resources of one type, by logical id.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    /// Write `{dir}/{stack_name}.template.json`, creating `dir` if needed.
    pub fn write_to(&self, dir: &Path, stack_name: &str) -> Result<PathBuf, SynthError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.template.json", stack_name));
        fs::write(&path, self.to_json_pretty()?)?;
        tracing::info!(path = %path.display(), "Wrote template");
        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties")]
    pub properties: Value,

    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,

    #[serde(rename = "UpdateReplacePolicy", skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,

    #[serde(rename = "Metadata", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
            metadata: None,
        }
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    /// Same policy on deletion and on replacement.
    pub fn with_deletion_policy(mut self, policy: &str) -> Self {
        self.deletion_policy = Some(policy.to_string());
        self.update_replace_policy = Some(policy.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    #[serde(rename = "Value")]
    pub value: Value,

    #[serde(rename = "Export", skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportName {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub parameter_type: String,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `{"Fn::GetAtt": [id, attr]}`
pub fn get_att(attribute: &ResourceAttribute) -> Value {
    json!({ "Fn::GetAtt": [attribute.logical_id, attribute.attribute] })
}

/// `{"Ref": id}`
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// Wrap strings holding `${...}` pseudo-parameters in `Fn::Sub`.
pub fn sub_if_needed(value: &str) -> Value {
    if value.contains("${") {
        json!({ "Fn::Sub": value })
    } else {
        json!(value)
    }
}

pub fn export_value(value: &ExportValue) -> Value {
    match value {
        ExportValue::Literal(literal) => json!(literal),
        ExportValue::Attribute(attribute) => get_att(attribute),
    }
}
