//! # awsx_ecs
//!
//! Fargate task sizing for awsx components.
//!
//! Fargate bills a fixed set of (vCPU, memory) tiers. This crate sums what a
//! task's containers ask for and picks the cheapest tier that covers it.
//!
//! ## Example
//!
//! ```rust
//! use awsx_ecs::{solve_fargate_capacity, FargateContainerRequest};
//!
//! let capacity = solve_fargate_capacity(&[FargateContainerRequest::new(512, 1024)]).unwrap();
//! assert_eq!(capacity.cpu, "512");
//! assert_eq!(capacity.memory, "1024");
//! ```

pub mod error;
pub mod fargate;
pub mod task;

pub use error::{EcsError, EcsResult};
pub use fargate::{
    fargate_cost, fargate_tiers, requested_capacity, solve_fargate_capacity, FargateCapacity, FargateCapacityTier,
    FargateContainerRequest, RequestedCapacity, MAX_FARGATE_MEMORY_GB, MAX_FARGATE_VCPU,
};
pub use task::{size_task, TaskSizing, TaskSizingRequest};
