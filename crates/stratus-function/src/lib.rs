//! Function descriptors for Stratus
//!
//! Two construction strategies produce the same [`FunctionDescriptor`]:
//!
//! - [`FunctionBuilder`]: incremental, chainable configuration finished by a
//!   consuming [`FunctionBuilder::build`]
//! - [`FunctionConstruct`]: every field supplied at construction time
//!
//! Both validate before anything reaches the [`ResourceGraphCompiler`].

pub mod builder;
pub mod compiler;
pub mod constructor;
pub mod descriptor;
mod draft;
pub mod runtime;
pub mod source;

pub use builder::{
    FunctionBuilder, FunctionProps, GoFunctionBuilder, NodeFunctionBuilder, PythonFunctionBuilder,
    RustFunctionBuilder,
};
pub use compiler::{
    BuildError, CompilerError, ExportValue, FunctionHandle, ResourceAttribute,
    ResourceGraphCompiler,
};
pub use constructor::{
    Binding, ConstructProps, FunctionConstruct, GoProps, NodeProps, PythonProps, RustProps,
    SourceProps,
};
pub use descriptor::{
    Architecture, FunctionDescriptor, LogGroupSpec, NetworkPlacement, RemovalPolicy,
    ResourceLimits, Scope, SecurityGroupRef, SubnetSelection, VpcRef,
};
pub use draft::{MAX_FUNCTION_NAME_LEN, MAX_MEMORY_MB, MAX_TIMEOUT_SECS, MIN_MEMORY_MB};
pub use runtime::{Runtime, RuntimeFamily};
pub use source::{FunctionSource, GoDraft, NodeDraft, PythonDraft, RustDraft, SourceDraft};
