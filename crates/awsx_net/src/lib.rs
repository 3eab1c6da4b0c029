//! # awsx_net
//!
//! VPC address-space planning for awsx components.
//!
//! This crate turns a VPC CIDR, a list of availability zones and optional
//! subnet templates into a conflict-free subnet layout, and decides where NAT
//! gateways live.
//!
//! ## Features
//!
//! - IPv4 CIDR subdivision and overlap checks
//! - Default (private + public) and templated per-zone subnet layouts
//! - NAT gateway strategies: `OnePerAz`, `Single`, `None`
//! - Full VPC plans with NAT placements and default routes
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use awsx_net::{NatGatewayStrategy, StaticZones, SubnetSpecInput, VpcArgs, VpcPlanner};
//!
//! let zones = StaticZones::new(vec!["us-east-1a".into(), "us-east-1b".into()]);
//! let planner = VpcPlanner::new(Arc::new(zones));
//!
//! let args = VpcArgs::new()
//!     .with_zone_count(2)
//!     .with_nat_strategy(NatGatewayStrategy::Single)
//!     .with_subnet(SubnetSpecInput::private("app", 20))
//!     .with_subnet(SubnetSpecInput::public("edge", 24));
//!
//! let plan = planner.plan("main", &args).unwrap();
//! assert_eq!(plan.nat_gateways.len(), 1);
//! ```

pub mod cidr;
pub mod error;
pub mod nat;
pub mod subnet;
pub mod vpc;

pub use cidr::{cidr_subnet_v4, do_subnets_overlap, next_pow2, Ipv4Cidr};
pub use error::{NetError, NetResult};
pub use nat::NatGatewayStrategy;
pub use subnet::{
    get_overlapping_subnets, plan_subnets, sort_for_provisioning, validate_subnet_plan, validate_subnets_within,
    SubnetSpec, SubnetSpecInput, SubnetType,
};
pub use vpc::{
    AvailabilityZoneSource, EipAllocation, NatGatewayArgs, NatGatewayPlacement, RoutePlan, RouteTarget,
    StaticZones, VpcArgs, VpcPlan, VpcPlanner, DEFAULT_AVAILABILITY_ZONE_COUNT, DEFAULT_VPC_CIDR,
};
