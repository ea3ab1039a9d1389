//! Deployment environment types.
//!
//! An [`Environment`] holds the static settings of one deployment context
//! (organization, application, environment name and region). It is loaded once
//! at process start and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Names of the supported deployment environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentName {
    Local,
    Ci,
    Dev,
    Qa,
    Stage,
    Prod,
}

impl EnvironmentName {
    /// Every environment name, in promotion order.
    pub const ALL: [EnvironmentName; 6] = [
        EnvironmentName::Local,
        EnvironmentName::Ci,
        EnvironmentName::Dev,
        EnvironmentName::Qa,
        EnvironmentName::Stage,
        EnvironmentName::Prod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentName::Local => "local",
            EnvironmentName::Ci => "ci",
            EnvironmentName::Dev => "dev",
            EnvironmentName::Qa => "qa",
            EnvironmentName::Stage => "stage",
            EnvironmentName::Prod => "prod",
        }
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvironmentName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownEnvironment(s.to_string()))
    }
}

/// Regions a stack can be deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "us-east-1")]
    UsEast1,
    #[serde(rename = "us-west-2")]
    UsWest2,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::UsEast1 => "us-east-1",
            Region::UsWest2 => "us-west-2",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "us-east-1" => Ok(Region::UsEast1),
            "us-west-2" => Ok(Region::UsWest2),
            other => Err(ConfigError::UnknownRegion(other.to_string())),
        }
    }
}

/// Static settings of one deployment environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Organization that owns the deployment (first naming segment).
    pub org_name: String,

    /// Environment name.
    pub env_name: EnvironmentName,

    /// Application name (second naming segment).
    pub app_name: String,

    /// Target region.
    pub region: Region,

    /// Whether functions in this environment may use provisioned concurrency.
    #[serde(default)]
    pub provisioned_concurrency_enabled: bool,
}

impl Environment {
    /// Create an environment with provisioned concurrency disabled.
    pub fn new(
        org_name: impl Into<String>,
        app_name: impl Into<String>,
        env_name: EnvironmentName,
        region: Region,
    ) -> Self {
        Self {
            org_name: org_name.into(),
            env_name,
            app_name: app_name.into(),
            region,
            provisioned_concurrency_enabled: false,
        }
    }
}
