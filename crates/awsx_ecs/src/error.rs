//! Error types for ECS sizing.

use thiserror::Error;

/// Result type alias for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EcsError {
    #[error("Could not find fargate config that could satisfy: {vcpu} vCPU and {mem_gb}GB")]
    NoCapacityFit { vcpu: f64, mem_gb: f64 },
}
