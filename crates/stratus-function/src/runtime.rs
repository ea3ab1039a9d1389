//! Function runtimes.

use std::fmt;
use std::str::FromStr;

use stratus_core::ConfigError;

/// Language family of a function. Selects the source layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFamily {
    Node,
    Python,
    Go,
    Rust,
}

impl fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeFamily::Node => "Nodejs",
            RuntimeFamily::Python => "Python",
            RuntimeFamily::Go => "Go",
            RuntimeFamily::Rust => "Rust",
        };
        f.write_str(name)
    }
}

/// Supported managed runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runtime {
    Nodejs18,
    Nodejs20,
    Nodejs22,
    Python39,
    Python310,
    Python311,
    Python312,
    Python313,
    /// OS-only runtime used by compiled Go and Rust binaries.
    ProvidedAl2,
    ProvidedAl2023,
}

impl Runtime {
    pub const ALL: [Runtime; 10] = [
        Runtime::Nodejs18,
        Runtime::Nodejs20,
        Runtime::Nodejs22,
        Runtime::Python39,
        Runtime::Python310,
        Runtime::Python311,
        Runtime::Python312,
        Runtime::Python313,
        Runtime::ProvidedAl2,
        Runtime::ProvidedAl2023,
    ];

    pub const NODEJS_LATEST: Runtime = Runtime::Nodejs22;

    pub fn name(&self) -> &'static str {
        match self {
            Runtime::Nodejs18 => "nodejs18.x",
            Runtime::Nodejs20 => "nodejs20.x",
            Runtime::Nodejs22 => "nodejs22.x",
            Runtime::Python39 => "python3.9",
            Runtime::Python310 => "python3.10",
            Runtime::Python311 => "python3.11",
            Runtime::Python312 => "python3.12",
            Runtime::Python313 => "python3.13",
            Runtime::ProvidedAl2 => "provided.al2",
            Runtime::ProvidedAl2023 => "provided.al2023",
        }
    }

    /// Whether functions of `family` can run on this runtime.
    pub fn supports(&self, family: RuntimeFamily) -> bool {
        match self {
            Runtime::Nodejs18 | Runtime::Nodejs20 | Runtime::Nodejs22 => {
                family == RuntimeFamily::Node
            }
            Runtime::Python39
            | Runtime::Python310
            | Runtime::Python311
            | Runtime::Python312
            | Runtime::Python313 => family == RuntimeFamily::Python,
            Runtime::ProvidedAl2 | Runtime::ProvidedAl2023 => {
                matches!(family, RuntimeFamily::Go | RuntimeFamily::Rust)
            }
        }
    }

    /// Fail unless this runtime can host `family`.
    pub fn check_family(&self, family: RuntimeFamily) -> Result<(), ConfigError> {
        if self.supports(family) {
            Ok(())
        } else {
            Err(ConfigError::RuntimeMismatch {
                expected: family.to_string(),
                actual: self.name().to_string(),
            })
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Runtime {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Runtime::ALL
            .into_iter()
            .find(|runtime| runtime.name() == s)
            .ok_or_else(|| ConfigError::UnknownRuntime(s.to_string()))
    }
}
