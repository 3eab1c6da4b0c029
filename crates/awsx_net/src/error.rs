//! Error types for network planning.

use thiserror::Error;

use crate::cidr::Ipv4Cidr;
use crate::subnet::SubnetSpec;

/// Result type alias for network planning operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors that can occur while planning VPC address space.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("Error parsing IP range: {0}")]
    MalformedInput(String),

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("Subnet '{name}' requests a /{mask} mask, which is larger than its /{base} base block")]
    NegativeBitWidth { name: String, mask: u8, base: u8 },

    #[error("{}", overlap_message(.0))]
    OverlappingSubnets(Vec<SubnetSpec>),

    #[error("Subnet '{name}' ({cidr}) falls outside the VPC CIDR {vpc}")]
    SubnetOutsideVpc { name: String, cidr: Ipv4Cidr, vpc: Ipv4Cidr },

    #[error("Unknown NAT Gateway strategy {0}")]
    UnknownStrategy(String),

    #[error("Invalid subnet topology for NAT Gateway strategy: {0}")]
    InvalidTopologyForStrategy(String),

    #[error("Invalid Elastic IP count: {0}")]
    InvalidEipCount(String),

    #[error("At least one availability zone is required to plan subnets")]
    MissingAvailabilityZones,

    #[error("Availability zone '{0}' is listed more than once")]
    DuplicateAvailabilityZone(String),

    #[error("Only one of [availabilityZoneNames] and [numberOfAvailabilityZones] can be specified")]
    ConflictingZoneSelection,

    #[error(
        "The configured region does not have at least {desired} Availability Zones (found {available}). \
         Either specify an explicit list of zones in availabilityZoneNames or choose a region with at least {desired} AZs."
    )]
    InsufficientAvailabilityZones { desired: usize, available: usize },

    #[error("Availability zone lookup failed: {0}")]
    ZoneLookup(String),
}

fn overlap_message(specs: &[SubnetSpec]) -> String {
    let mut message = String::from(
        "The following subnets overlap with at least one other subnet. Make the CIDR for the VPC larger, \
         reduce the size of the subnets per AZ, or use less Availability Zones:\n\n",
    );
    for (i, spec) in specs.iter().enumerate() {
        message.push_str(&format!("{}. {}: {}\n", i + 1, spec.subnet_name, spec.cidr_block));
    }
    message
}
