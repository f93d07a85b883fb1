//! # Domain Model
//!
//! Managed resources, their conditions, operations and scheduling units.

pub mod condition;
pub mod resource;
pub mod status;
pub mod work;

pub use condition::Condition;
pub use resource::{
    seed_conditions, ErrorPointer, LifecycleError, ManagedResource, Operation, ResourceKind,
};
pub use status::{ComponentType, ConditionStatus, ManagedResourceStatus, OperationType};
pub use work::Work;
