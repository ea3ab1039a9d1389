//! Source-layout conventions for function code.
//!
//! | Runtime | Source reference |
//! |---------|------------------|
//! | Node    | `{root}/{name}/index.ts` |
//! | Python  | directory `{root}/{name}`, handler `handler` |
//! | Go      | `{root}/{name}/main.go`, module root `{root}/{name}` |
//! | Rust    | `{root}/{name}/Cargo.toml` |

use std::path::{Path, PathBuf};

/// Default root of function sources, relative to the project directory.
pub const LAMBDA_BASEPATH: &str = "src/lambda";

/// Default Python handler symbol.
pub const DEFAULT_PYTHON_HANDLER: &str = "handler";

/// Root directory that function source paths are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    root: PathBuf,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self::new(LAMBDA_BASEPATH)
    }
}

impl SourceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the sources of `name`.
    pub fn dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn node_entry(&self, name: &str) -> PathBuf {
        self.dir(name).join("index.ts")
    }

    pub fn python_entry(&self, name: &str) -> PathBuf {
        self.dir(name)
    }

    pub fn go_entry(&self, name: &str) -> PathBuf {
        self.dir(name).join("main.go")
    }

    pub fn go_module_dir(&self, name: &str) -> PathBuf {
        self.dir(name)
    }

    pub fn rust_manifest(&self, name: &str) -> PathBuf {
        self.dir(name).join("Cargo.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_conventions() {
        let layout = SourceLayout::default();
        assert_eq!(layout.node_entry("a"), PathBuf::from("src/lambda/a/index.ts"));
        assert_eq!(layout.python_entry("a"), PathBuf::from("src/lambda/a"));
        assert_eq!(layout.go_entry("a"), PathBuf::from("src/lambda/a/main.go"));
        assert_eq!(layout.go_module_dir("a"), PathBuf::from("src/lambda/a"));
        assert_eq!(layout.rust_manifest("a"), PathBuf::from("src/lambda/a/Cargo.toml"));
    }

    #[test]
    fn test_custom_root() {
        let layout = SourceLayout::new("/srv/functions");
        assert_eq!(
            layout.rust_manifest("dummy-rust-lambda"),
            PathBuf::from("/srv/functions/dummy-rust-lambda/Cargo.toml")
        );
    }
}
