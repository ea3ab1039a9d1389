//! Runtime-specific source references.
//!
//! Each runtime family carries a different set of source fields. A draft
//! holds the fields while a function is being configured; [`SourceDraft::finish`]
//! checks the mandatory ones and yields a [`FunctionSource`].

use std::path::PathBuf;

use stratus_core::layout::DEFAULT_PYTHON_HANDLER;
use stratus_core::{ConfigError, SourceLayout};

use crate::runtime::{Runtime, RuntimeFamily};

/// Source of a function, one variant per runtime family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionSource {
    Node {
        entry: PathBuf,
    },
    Python {
        entry: PathBuf,
        index: Option<String>,
        handler: Option<String>,
    },
    Go {
        entry: PathBuf,
        module_dir: PathBuf,
    },
    Rust {
        manifest_path: PathBuf,
    },
}

impl FunctionSource {
    pub fn family(&self) -> RuntimeFamily {
        match self {
            FunctionSource::Node { .. } => RuntimeFamily::Node,
            FunctionSource::Python { .. } => RuntimeFamily::Python,
            FunctionSource::Go { .. } => RuntimeFamily::Go,
            FunctionSource::Rust { .. } => RuntimeFamily::Rust,
        }
    }

    /// Directory or file the deployment package is built from.
    pub fn code_path(&self) -> &PathBuf {
        match self {
            FunctionSource::Node { entry } => entry,
            FunctionSource::Python { entry, .. } => entry,
            FunctionSource::Go { module_dir, .. } => module_dir,
            FunctionSource::Rust { manifest_path } => manifest_path,
        }
    }

    /// Handler symbol passed to the runtime.
    pub fn handler(&self) -> String {
        match self {
            FunctionSource::Node { .. } => "index.handler".to_string(),
            FunctionSource::Python { index, handler, .. } => {
                let module = index
                    .as_deref()
                    .map(|i| i.trim_end_matches(".py"))
                    .unwrap_or("index");
                format!("{}.{}", module, handler.as_deref().unwrap_or(DEFAULT_PYTHON_HANDLER))
            }
            // Compiled binaries are started through the `bootstrap` executable.
            FunctionSource::Go { .. } | FunctionSource::Rust { .. } => "bootstrap".to_string(),
        }
    }
}

/// Partially configured source of one runtime family.
pub trait SourceDraft: Default + Clone + std::fmt::Debug {
    const FAMILY: RuntimeFamily;

    /// Draft pre-filled from the source-layout conventions for `name`.
    fn with_defaults(name: &str, layout: &SourceLayout) -> Self;

    fn default_runtime() -> Runtime;

    /// Check mandatory fields.
    fn finish(&self) -> Result<FunctionSource, ConfigError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDraft {
    pub entry: Option<PathBuf>,
}

impl SourceDraft for NodeDraft {
    const FAMILY: RuntimeFamily = RuntimeFamily::Node;

    fn with_defaults(name: &str, layout: &SourceLayout) -> Self {
        Self {
            entry: Some(layout.node_entry(name)),
        }
    }

    fn default_runtime() -> Runtime {
        Runtime::NODEJS_LATEST
    }

    fn finish(&self) -> Result<FunctionSource, ConfigError> {
        let entry = self.entry.clone().ok_or(ConfigError::MissingField("entry"))?;
        Ok(FunctionSource::Node { entry })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PythonDraft {
    pub entry: Option<PathBuf>,
    pub index: Option<String>,
    pub handler: Option<String>,
}

impl SourceDraft for PythonDraft {
    const FAMILY: RuntimeFamily = RuntimeFamily::Python;

    fn with_defaults(name: &str, layout: &SourceLayout) -> Self {
        Self {
            entry: Some(layout.python_entry(name)),
            index: None,
            handler: Some(DEFAULT_PYTHON_HANDLER.to_string()),
        }
    }

    fn default_runtime() -> Runtime {
        Runtime::Python313
    }

    fn finish(&self) -> Result<FunctionSource, ConfigError> {
        let entry = self.entry.clone().ok_or(ConfigError::MissingField("entry"))?;
        Ok(FunctionSource::Python {
            entry,
            index: self.index.clone(),
            handler: self.handler.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoDraft {
    pub entry: Option<PathBuf>,
    pub module_dir: Option<PathBuf>,
}

impl SourceDraft for GoDraft {
    const FAMILY: RuntimeFamily = RuntimeFamily::Go;

    fn with_defaults(name: &str, layout: &SourceLayout) -> Self {
        Self {
            entry: Some(layout.go_entry(name)),
            module_dir: Some(layout.go_module_dir(name)),
        }
    }

    fn default_runtime() -> Runtime {
        Runtime::ProvidedAl2023
    }

    fn finish(&self) -> Result<FunctionSource, ConfigError> {
        let entry = self.entry.clone().ok_or(ConfigError::MissingField("entry"))?;
        let module_dir = self
            .module_dir
            .clone()
            .ok_or(ConfigError::MissingField("moduleDir"))?;
        Ok(FunctionSource::Go { entry, module_dir })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RustDraft {
    pub manifest_path: Option<PathBuf>,
}

impl SourceDraft for RustDraft {
    const FAMILY: RuntimeFamily = RuntimeFamily::Rust;

    fn with_defaults(name: &str, layout: &SourceLayout) -> Self {
        Self {
            manifest_path: Some(layout.rust_manifest(name)),
        }
    }

    fn default_runtime() -> Runtime {
        Runtime::ProvidedAl2023
    }

    fn finish(&self) -> Result<FunctionSource, ConfigError> {
        let manifest_path = self
            .manifest_path
            .clone()
            .ok_or(ConfigError::MissingField("manifestPath"))?;
        Ok(FunctionSource::Rust { manifest_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_defaults() {
        let draft = PythonDraft::with_defaults("ingest", &SourceLayout::default());
        let source = draft.finish().unwrap();
        assert_eq!(
            source,
            FunctionSource::Python {
                entry: PathBuf::from("src/lambda/ingest"),
                index: None,
                handler: Some("handler".to_string()),
            }
        );
        assert_eq!(source.handler(), "index.handler");
    }

    #[test]
    fn test_missing_fields_are_named() {
        assert_eq!(PythonDraft::default().finish().unwrap_err().field(), Some("entry"));
        assert_eq!(NodeDraft::default().finish().unwrap_err().field(), Some("entry"));
        assert_eq!(RustDraft::default().finish().unwrap_err().field(), Some("manifestPath"));

        let go = GoDraft {
            entry: Some(PathBuf::from("main.go")),
            module_dir: None,
        };
        assert_eq!(go.finish().unwrap_err().field(), Some("moduleDir"));
    }

    #[test]
    fn test_go_defaults() {
        let source = GoDraft::with_defaults("dummy-go-lambda", &SourceLayout::default())
            .finish()
            .unwrap();
        assert_eq!(source.code_path(), &PathBuf::from("src/lambda/dummy-go-lambda"));
        assert_eq!(source.handler(), "bootstrap");
        assert_eq!(source.family(), RuntimeFamily::Go);
    }

    #[test]
    fn test_python_index_handler() {
        let source = FunctionSource::Python {
            entry: PathBuf::from("src/lambda/x"),
            index: Some("main.py".to_string()),
            handler: Some("run".to_string()),
        };
        assert_eq!(source.handler(), "main.run");
    }
}
