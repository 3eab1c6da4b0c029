//! # awsx_ecr
//!
//! Container registry planning for awsx components.
//!
//! ## Features
//!
//! - Simplified lifecycle rules compiled into ECR policy JSON
//! - Dense rule priorities with the catch-all `any` rule placed last
//! - Repository name validation and lifecycle defaults
//!
//! ## Example
//!
//! ```rust
//! use awsx_ecr::{compile_lifecycle_policy, LifecyclePolicyRule};
//!
//! let rules = vec![
//!     LifecyclePolicyRule::any().keep_images(20),
//!     LifecyclePolicyRule::untagged().expire_after_days(7),
//! ];
//!
//! let json = compile_lifecycle_policy(&rules).unwrap();
//! assert!(json.contains("\"rulePriority\":2"));
//! ```

pub mod error;
pub mod lifecycle;
pub mod repository;

pub use error::{EcrError, EcrResult};
pub use lifecycle::{
    build_lifecycle_policy, compile_lifecycle_policy, ActionType, CountType, CountUnit, LifecyclePolicyRule,
    PolicyRule, PolicyRuleDocument, RuleAction, RuleSelection, TagStatus,
};
pub use repository::{
    plan_repository, validate_repository_name, ImageTagMutability, LifecyclePolicyArgs, RepositoryArgs,
    RepositoryPlan,
};
