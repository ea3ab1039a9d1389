//! Deployment target (account, region, owner) read from process variables.
//!
//! Every value is optional. When a value is absent the deployment engine falls
//! back to its ambient provider configuration.

use std::collections::BTreeMap;

use crate::environment::Environment;

pub const AWS_ACCOUNT_VAR: &str = "AWS_ACCOUNT";
pub const CDK_DEFAULT_ACCOUNT_VAR: &str = "CDK_DEFAULT_ACCOUNT";
pub const AWS_REGION_VAR: &str = "AWS_REGION";
pub const CDK_DEFAULT_REGION_VAR: &str = "CDK_DEFAULT_REGION";
pub const PROJECT_OWNER_VAR: &str = "PROJECT_OWNER";

/// Account/region a stack is bound to, plus the owner tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentTarget {
    pub account: Option<String>,
    pub region: Option<String>,
    pub owner: Option<String>,
}

impl DeploymentTarget {
    /// Read the target from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the target through an arbitrary variable lookup.
    ///
    /// Empty values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            account: get(AWS_ACCOUNT_VAR).or_else(|| get(CDK_DEFAULT_ACCOUNT_VAR)),
            region: get(AWS_REGION_VAR).or_else(|| get(CDK_DEFAULT_REGION_VAR)),
            owner: get(PROJECT_OWNER_VAR),
        }
    }

    /// Tags applied to every resource of a stack.
    pub fn stack_tags(
        &self,
        environment: &Environment,
        stack_name: &str,
    ) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        if let Some(owner) = &self.owner {
            tags.insert("OWNER".to_string(), owner.clone());
        }
        tags.insert("APP".to_string(), environment.app_name.clone());
        tags.insert("STACK".to_string(), stack_name.to_string());
        tags
    }
}
