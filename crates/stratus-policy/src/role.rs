//! Execution role synthesis.
//!
//! A role is assembled from a [`RolePermissions`] accumulator. Inline
//! statements are always, in order: default execution statements, custom
//! statements, model statements, knowledge-base statements, then grant
//! statements in grant order.

use serde::Serialize;

use crate::factory::{
    FoundationModel, default_execution_statements, knowledge_base_statements,
    model_invocation_statements,
};
use crate::resources::{Grant, ManagedPolicyRef};
use crate::statement::{PolicyDocument, PolicyStatement};

/// Service principal allowed to assume function roles.
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

/// Managed policy every execution role starts with.
pub const VPC_ACCESS_EXECUTION_POLICY: &str = "service-role/AWSLambdaVPCAccessExecutionRole";

/// Model access requested for a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelAccess {
    pub models: Vec<FoundationModel>,
    /// Overrides the default invoke actions.
    pub actions: Option<Vec<String>>,
}

/// Knowledge-base access requested for a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBaseAccess {
    pub knowledge_base_ids: Vec<String>,
    /// Overrides the default retrieval/ingestion actions.
    pub actions: Option<Vec<String>>,
}

/// Permissions accumulated while a function is being configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissions {
    statements: Vec<PolicyStatement>,
    models: Option<ModelAccess>,
    knowledge_bases: Option<KnowledgeBaseAccess>,
    grants: Vec<Grant>,
    managed_policies: Vec<ManagedPolicyRef>,
}

impl RolePermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append custom statements.
    pub fn add_statements(&mut self, statements: impl IntoIterator<Item = PolicyStatement>) {
        self.statements.extend(statements);
    }

    /// Set model access (last write wins).
    pub fn set_models(&mut self, access: ModelAccess) {
        self.models = Some(access);
    }

    /// Set knowledge-base access (last write wins).
    pub fn set_knowledge_bases(&mut self, access: KnowledgeBaseAccess) {
        self.knowledge_bases = Some(access);
    }

    /// Record a grant. Returns `false` when the same grant was already present.
    pub fn grant(&mut self, grant: Grant) -> bool {
        if self.grants.contains(&grant) {
            tracing::debug!(?grant, "grant already present on role");
            return false;
        }
        self.grants.push(grant);
        true
    }

    /// Attach a managed policy. Returns `false` when it was already attached.
    pub fn add_managed_policy(&mut self, policy: ManagedPolicyRef) -> bool {
        if self.managed_policies.contains(&policy) {
            tracing::warn!(policy = policy.arn(), "managed policy attached twice; keeping one");
            return false;
        }
        self.managed_policies.push(policy);
        true
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    pub fn managed_policies(&self) -> &[ManagedPolicyRef] {
        &self.managed_policies
    }
}

/// A synthesized function execution role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRole {
    pub assumed_by: String,
    pub managed_policies: Vec<ManagedPolicyRef>,
    pub statements: Vec<PolicyStatement>,
    pub grants: Vec<Grant>,
}

impl ExecutionRole {
    /// Build the role from accumulated permissions.
    pub fn synthesize(permissions: &RolePermissions) -> Self {
        let mut statements = default_execution_statements();
        statements.extend(permissions.statements.iter().cloned());

        if let Some(access) = &permissions.models {
            statements.extend(model_invocation_statements(
                Some(access.models.as_slice()),
                access.actions.as_deref(),
            ));
        }

        if let Some(access) = &permissions.knowledge_bases {
            statements.extend(knowledge_base_statements(
                Some(access.knowledge_base_ids.as_slice()),
                access.actions.as_deref(),
            ));
        }

        for grant in &permissions.grants {
            statements.extend(grant.statements());
        }

        let base = ManagedPolicyRef::aws_managed(VPC_ACCESS_EXECUTION_POLICY);
        let mut managed_policies = vec![base.clone()];
        managed_policies.extend(
            permissions
                .managed_policies
                .iter()
                .filter(|p| **p != base)
                .cloned(),
        );

        Self {
            assumed_by: LAMBDA_SERVICE_PRINCIPAL.to_string(),
            managed_policies,
            statements,
            grants: permissions.grants.clone(),
        }
    }

    /// Inline policy document of the role.
    pub fn policy_document(&self) -> PolicyDocument {
        PolicyDocument::new(self.statements.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::SecretRef;

    #[test]
    fn test_default_role() {
        let role = ExecutionRole::synthesize(&RolePermissions::new());
        assert_eq!(role.assumed_by, LAMBDA_SERVICE_PRINCIPAL);
        assert_eq!(role.statements, default_execution_statements());
        assert_eq!(role.managed_policies.len(), 1);
        assert!(role.managed_policies[0].arn().ends_with(VPC_ACCESS_EXECUTION_POLICY));
    }

    #[test]
    fn test_managed_policies_keep_attachment_order() {
        let mut permissions = RolePermissions::new();
        permissions.add_managed_policy(ManagedPolicyRef::aws_managed("AmazonBedrockFullAccess"));
        permissions.add_managed_policy(ManagedPolicyRef::aws_managed("AmazonS3FullAccess"));

        let role = ExecutionRole::synthesize(&permissions);
        let arns: Vec<&str> = role.managed_policies.iter().map(|p| p.arn()).collect();
        assert_eq!(
            arns,
            vec![
                "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole",
                "arn:aws:iam::aws:policy/AmazonBedrockFullAccess",
                "arn:aws:iam::aws:policy/AmazonS3FullAccess",
            ]
        );
        assert_eq!(role.statements, default_execution_statements());
    }

    #[test]
    fn test_statement_order() {
        let mut permissions = RolePermissions::new();
        permissions.grant(Grant::SecretRead(SecretRef::named("s")));
        permissions.set_knowledge_bases(KnowledgeBaseAccess {
            knowledge_base_ids: vec!["KB1".to_string()],
            actions: None,
        });
        permissions.set_models(ModelAccess {
            models: vec![FoundationModel::new("m")],
            actions: None,
        });
        permissions.add_statements([PolicyStatement::allow(["arn:custom"], ["x:Y"])]);

        let role = ExecutionRole::synthesize(&permissions);
        let first_resources: Vec<&str> = role
            .statements
            .iter()
            .map(|s| s.resources[0].as_str())
            .collect();
        assert_eq!(first_resources[0], "*");
        assert_eq!(first_resources[1], "*");
        assert_eq!(first_resources[2], "arn:custom");
        assert!(first_resources[3].contains("foundation-model/m"));
        assert!(first_resources[4].contains("knowledge-base/KB1"));
        assert!(first_resources[5].contains("secret:s-"));
        assert_eq!(role.statements.len(), 6);
    }

    #[test]
    fn test_repeated_grant_is_idempotent() {
        let mut permissions = RolePermissions::new();
        assert!(permissions.grant(Grant::SecretRead(SecretRef::named("s"))));
        assert!(!permissions.grant(Grant::SecretRead(SecretRef::named("s"))));

        let role = ExecutionRole::synthesize(&permissions);
        assert_eq!(role.grants.len(), 1);
        assert_eq!(role.statements.len(), 3);
    }
}
