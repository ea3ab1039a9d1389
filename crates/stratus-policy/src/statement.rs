//! Authorization statements and policy documents.

use serde::{Deserialize, Serialize};

/// IAM policy language version used for every generated document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Whether a statement allows or denies its actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// One allow/deny rule over a list of resource patterns and actions.
///
/// Statements are plain values: they are combined by concatenation and never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(rename = "Effect")]
    pub effect: Effect,

    #[serde(rename = "Resource")]
    pub resources: Vec<String>,

    #[serde(rename = "Action")]
    pub actions: Vec<String>,
}

impl PolicyStatement {
    pub fn new<R, A>(effect: Effect, resources: R, actions: A) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            effect,
            resources: resources.into_iter().map(Into::into).collect(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// An `Allow` statement.
    pub fn allow<R, A>(resources: R, actions: A) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self::new(Effect::Allow, resources, actions)
    }

    /// A `Deny` statement.
    pub fn deny<R, A>(resources: R, actions: A) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self::new(Effect::Deny, resources, actions)
    }
}

/// An inline policy document, statements kept in attachment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,

    #[serde(rename = "Statement")]
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statements,
        }
    }
}
