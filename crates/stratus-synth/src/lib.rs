//! Stratus template synthesis
//!
//! [`TemplateCompiler`] implements the resource-graph compiler boundary and
//! renders everything it is handed into a single declarative [`Template`]:
//! functions, their roles and log groups, secrets, workflows, and exported
//! outputs.

pub mod compiler;
pub mod error;
pub mod template;

pub use compiler::{TARGET_METADATA_KEY, TemplateCompiler, logical_id};
pub use error::SynthError;
pub use template::{Output, Parameter, Resource, Template};
