//! Reusable statement templates.
//!
//! Model and knowledge-base templates treat an absent identifier list as
//! "no grant": callers must opt in explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::statement::PolicyStatement;

/// Region pseudo-parameter, resolved by the deployment engine.
pub const AWS_REGION_TOKEN: &str = "${AWS::Region}";

/// Account pseudo-parameter, resolved by the deployment engine.
pub const AWS_ACCOUNT_TOKEN: &str = "${AWS::AccountId}";

pub const DEFAULT_LOG_ACTIONS: &[&str] = &[
    "logs:CreateLogGroup",
    "logs:CreateLogStream",
    "logs:DescribeLogGroups",
    "logs:DescribeLogStreams",
    "logs:PutLogEvents",
];

pub const DEFAULT_NETWORK_INTERFACE_ACTIONS: &[&str] = &[
    "ec2:DescribeNetworkInterfaces",
    "ec2:DetachNetworkInterface",
    "ec2:CreateNetworkInterface",
    "ec2:DeleteNetworkInterface",
    "ec2:DescribeInstances",
    "ec2:AttachNetworkInterface",
];

pub const DEFAULT_MODEL_ACTIONS: &[&str] = &[
    "bedrock:InvokeModel",
    "bedrock:InvokeModelWithResponseStream",
];

pub const DEFAULT_KNOWLEDGE_BASE_ACTIONS: &[&str] = &[
    "bedrock:InvokeAgent",
    "bedrock:InvokeModelWithResponseStream",
    "bedrock:Retrieve",
    "bedrock:RetrieveAndGenerate",
    "bedrock:StartIngestionJob",
    "bedrock:StopIngestionJob",
    "bedrock:ListIngestionJobs",
];

/// Identifier of a foundation model (e.g. `amazon.titan-embed-text-v2:0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoundationModel(String);

impl FoundationModel {
    pub const AMAZON_TITAN_EMBED_TEXT_V2: &'static str = "amazon.titan-embed-text-v2:0";
    pub const ANTHROPIC_CLAUDE_3_5_SONNET: &'static str = "anthropic.claude-3-5-sonnet-20240620-v1:0";
    pub const ANTHROPIC_CLAUDE_3_HAIKU: &'static str = "anthropic.claude-3-haiku-20240307-v1:0";

    pub fn new(model_id: impl Into<String>) -> Self {
        Self(model_id.into())
    }

    pub fn model_id(&self) -> &str {
        &self.0
    }

    /// Resource pattern of the model in the deployment region.
    pub fn arn(&self) -> String {
        format!("arn:aws:bedrock:{}::foundation-model/{}", AWS_REGION_TOKEN, self.0)
    }
}

impl fmt::Display for FoundationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource pattern of a knowledge base in the deployment account and region.
pub fn knowledge_base_arn(knowledge_base_id: &str) -> String {
    format!(
        "arn:aws:bedrock:{}:{}:knowledge-base/{}",
        AWS_REGION_TOKEN, AWS_ACCOUNT_TOKEN, knowledge_base_id
    )
}

/// Log-group and network-interface lifecycle permissions over `*`.
pub fn default_execution_statements() -> Vec<PolicyStatement> {
    vec![
        PolicyStatement::allow(["*"], DEFAULT_LOG_ACTIONS.iter().copied()),
        PolicyStatement::allow(["*"], DEFAULT_NETWORK_INTERFACE_ACTIONS.iter().copied()),
    ]
}

/// One statement per model, scoped to that model.
pub fn model_invocation_statements(
    models: Option<&[FoundationModel]>,
    actions: Option<&[String]>,
) -> Vec<PolicyStatement> {
    let Some(models) = models else {
        return Vec::new();
    };

    let actions = resolve_actions(actions, DEFAULT_MODEL_ACTIONS);
    models
        .iter()
        .map(|model| PolicyStatement::allow([model.arn()], actions.iter().cloned()))
        .collect()
}

/// One statement per knowledge base, scoped to that knowledge base.
pub fn knowledge_base_statements(
    knowledge_base_ids: Option<&[String]>,
    actions: Option<&[String]>,
) -> Vec<PolicyStatement> {
    let Some(ids) = knowledge_base_ids else {
        return Vec::new();
    };

    let actions = resolve_actions(actions, DEFAULT_KNOWLEDGE_BASE_ACTIONS);
    ids.iter()
        .map(|id| PolicyStatement::allow([knowledge_base_arn(id)], actions.iter().cloned()))
        .collect()
}

fn resolve_actions(actions: Option<&[String]>, defaults: &[&str]) -> Vec<String> {
    match actions {
        Some(actions) => actions.to_vec(),
        None => defaults.iter().map(|a| a.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Effect;

    #[test]
    fn test_default_statements() {
        let statements = default_execution_statements();
        assert_eq!(statements.len(), 2);
        for statement in &statements {
            assert_eq!(statement.effect, Effect::Allow);
            assert_eq!(statement.resources, vec!["*".to_string()]);
        }
        assert!(statements[0].actions.contains(&"logs:PutLogEvents".to_string()));
        assert!(statements[1].actions.contains(&"ec2:CreateNetworkInterface".to_string()));
    }

    #[test]
    fn test_absent_identifiers_grant_nothing() {
        assert!(model_invocation_statements(None, None).is_empty());
        assert!(knowledge_base_statements(None, None).is_empty());
    }

    #[test]
    fn test_model_statements_use_default_actions() {
        let models = [
            FoundationModel::new(FoundationModel::AMAZON_TITAN_EMBED_TEXT_V2),
            FoundationModel::new(FoundationModel::ANTHROPIC_CLAUDE_3_HAIKU),
        ];
        let statements = model_invocation_statements(Some(&models[..]), None);
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].resources,
            vec![
                "arn:aws:bedrock:${AWS::Region}::foundation-model/amazon.titan-embed-text-v2:0"
                    .to_string()
            ]
        );
        assert_eq!(statements[1].actions, DEFAULT_MODEL_ACTIONS);
    }

    #[test]
    fn test_model_statements_with_action_override() {
        let models = [FoundationModel::new("m")];
        let actions = vec!["bedrock:InvokeModel".to_string()];
        let statements = model_invocation_statements(Some(&models[..]), Some(actions.as_slice()));
        assert_eq!(statements[0].actions, actions);
    }

    #[test]
    fn test_knowledge_base_statements() {
        let ids = vec!["KB123".to_string()];
        let statements = knowledge_base_statements(Some(ids.as_slice()), None);
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].resources[0],
            "arn:aws:bedrock:${AWS::Region}:${AWS::AccountId}:knowledge-base/KB123"
        );
        assert!(statements[0].actions.contains(&"bedrock:StartIngestionJob".to_string()));
        assert_eq!(statements[0].actions.len(), DEFAULT_KNOWLEDGE_BASE_ACTIONS.len());
    }
}
