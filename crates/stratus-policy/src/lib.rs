//! Stratus authorization model
//!
//! Statements are plain values combined by concatenation. A function's
//! execution role is synthesized once, when its descriptor is built:
//!
//! 1. default execution statements (logs + network interfaces)
//! 2. custom statements
//! 3. foundation-model statements
//! 4. knowledge-base statements
//! 5. statements implied by resource grants (secrets, buckets, tables, queues)
//!
//! Absent model/knowledge-base identifiers never produce a grant.

pub mod factory;
pub mod resources;
pub mod role;
pub mod statement;

pub use factory::{
    FoundationModel, default_execution_statements, knowledge_base_statements,
    model_invocation_statements,
};
pub use resources::{BucketRef, Grant, LayerRef, ManagedPolicyRef, QueueRef, SecretRef, TableRef};
pub use role::{ExecutionRole, KnowledgeBaseAccess, ModelAccess, RolePermissions};
pub use statement::{Effect, PolicyDocument, PolicyStatement};
