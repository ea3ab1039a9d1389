//! References to external resources and the access grants on them.
//!
//! References are read-only identities. The same reference can be shared by
//! any number of functions; granting access on it never mutates it.

use serde::Serialize;

use crate::factory::{AWS_ACCOUNT_TOKEN, AWS_REGION_TOKEN};
use crate::statement::PolicyStatement;
use stratus_core::ConfigError;

/// A Secrets Manager secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SecretRef {
    pub name: String,
}

impl SecretRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// ARN pattern matching the secret (the service appends a random suffix).
    pub fn arn_pattern(&self) -> String {
        format!(
            "arn:aws:secretsmanager:{}:{}:secret:{}-??????",
            AWS_REGION_TOKEN, AWS_ACCOUNT_TOKEN, self.name
        )
    }
}

/// An S3 bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BucketRef {
    pub name: String,
}

impl BucketRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.name)
    }
}

/// An SQS queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueueRef {
    pub name: String,
}

impl QueueRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn arn(&self) -> String {
        format!("arn:aws:sqs:{}:{}:{}", AWS_REGION_TOKEN, AWS_ACCOUNT_TOKEN, self.name)
    }
}

/// A DynamoDB table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableRef {
    pub name: String,
}

impl TableRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn arn(&self) -> String {
        format!(
            "arn:aws:dynamodb:{}:{}:table/{}",
            AWS_REGION_TOKEN, AWS_ACCOUNT_TOKEN, self.name
        )
    }
}

/// A function layer version, referenced by ARN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LayerRef {
    arn: String,
}

impl LayerRef {
    pub fn from_arn(arn: impl Into<String>) -> Result<Self, ConfigError> {
        let arn = arn.into();
        if !arn.starts_with("arn:") || !arn.contains(":layer:") {
            return Err(ConfigError::invalid(
                "layer",
                format!("'{}' is not a layer version ARN", arn),
            ));
        }
        Ok(Self { arn })
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }
}

/// A managed policy attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ManagedPolicyRef {
    arn: String,
}

impl ManagedPolicyRef {
    /// A policy managed by the provider, e.g. `AmazonS3FullAccess` or
    /// `service-role/AWSLambdaVPCAccessExecutionRole`.
    pub fn aws_managed(name: &str) -> Self {
        Self {
            arn: format!("arn:aws:iam::aws:policy/{}", name),
        }
    }

    pub fn from_arn(arn: impl Into<String>) -> Result<Self, ConfigError> {
        let arn = arn.into();
        if !arn.starts_with("arn:") || !arn.contains(":policy/") {
            return Err(ConfigError::invalid(
                "managed policy",
                format!("'{}' is not a policy ARN", arn),
            ));
        }
        Ok(Self { arn })
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }
}

/// Access granted to a role on one external resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "resource", rename_all = "snake_case")]
pub enum Grant {
    SecretRead(SecretRef),
    BucketReadWrite(BucketRef),
    TableReadWriteData(TableRef),
    QueueConsumeAndSend(QueueRef),
}

impl Grant {
    /// Statements implementing the grant.
    pub fn statements(&self) -> Vec<PolicyStatement> {
        match self {
            Grant::SecretRead(secret) => vec![PolicyStatement::allow(
                [secret.arn_pattern()],
                ["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"],
            )],
            Grant::BucketReadWrite(bucket) => vec![PolicyStatement::allow(
                [bucket.arn(), format!("{}/*", bucket.arn())],
                [
                    "s3:GetObject*",
                    "s3:GetBucket*",
                    "s3:List*",
                    "s3:DeleteObject*",
                    "s3:PutObject",
                    "s3:PutObjectLegalHold",
                    "s3:PutObjectRetention",
                    "s3:PutObjectTagging",
                    "s3:PutObjectVersionTagging",
                    "s3:Abort*",
                ],
            )],
            Grant::TableReadWriteData(table) => vec![PolicyStatement::allow(
                [table.arn(), format!("{}/index/*", table.arn())],
                [
                    "dynamodb:BatchGetItem",
                    "dynamodb:GetRecords",
                    "dynamodb:GetShardIterator",
                    "dynamodb:Query",
                    "dynamodb:GetItem",
                    "dynamodb:Scan",
                    "dynamodb:ConditionCheckItem",
                    "dynamodb:BatchWriteItem",
                    "dynamodb:PutItem",
                    "dynamodb:UpdateItem",
                    "dynamodb:DeleteItem",
                    "dynamodb:DescribeTable",
                ],
            )],
            Grant::QueueConsumeAndSend(queue) => vec![
                PolicyStatement::allow(
                    [queue.arn()],
                    [
                        "sqs:ReceiveMessage",
                        "sqs:ChangeMessageVisibility",
                        "sqs:GetQueueUrl",
                        "sqs:DeleteMessage",
                        "sqs:GetQueueAttributes",
                    ],
                ),
                PolicyStatement::allow(
                    [queue.arn()],
                    ["sqs:SendMessage", "sqs:GetQueueAttributes", "sqs:GetQueueUrl"],
                ),
            ],
        }
    }
}
