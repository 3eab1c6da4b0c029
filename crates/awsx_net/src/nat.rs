//! NAT gateway placement strategies.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NetError, NetResult};
use crate::subnet::SubnetSpec;

/// How many NAT gateways a VPC gets.
///
/// The strategy holds no counters. Callers walk the availability zones in
/// order and pass the number of gateways created so far to
/// [`NatGatewayStrategy::should_create_nat_gateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NatGatewayStrategy {
    /// One gateway in every availability zone.
    #[default]
    OnePerAz,
    /// A single gateway shared by every zone.
    Single,
    /// No gateways; private subnets are not allowed.
    None,
}

impl NatGatewayStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NatGatewayStrategy::OnePerAz => "OnePerAz",
            NatGatewayStrategy::Single => "Single",
            NatGatewayStrategy::None => "None",
        }
    }

    /// Check the subnet topology against this strategy.
    pub fn validate_strategy(&self, subnets: &[SubnetSpec]) -> NetResult<()> {
        let has_public = subnets.iter().any(SubnetSpec::is_public);
        let has_private = subnets.iter().any(SubnetSpec::is_private);

        match self {
            NatGatewayStrategy::None if has_private => Err(NetError::InvalidTopologyForStrategy(
                "If private subnets are specified, NAT Gateway strategy cannot be 'None'.".to_string(),
            )),
            NatGatewayStrategy::OnePerAz | NatGatewayStrategy::Single if !(has_public && has_private) => {
                Err(NetError::InvalidTopologyForStrategy(format!(
                    "If NAT Gateway strategy is '{}', both private and public subnets must be declared. \
                     The private subnet creates the need for a NAT Gateway, and the public subnet is \
                     required to host the NAT Gateway resource.",
                    self
                )))
            }
            _ => Ok(()),
        }
    }

    /// Check user-supplied Elastic IP allocation ids against the zone count.
    pub fn validate_eips<E, Z>(&self, eips: &[E], availability_zones: &[Z]) -> NetResult<()> {
        let eip_count = eips.len();

        match self {
            NatGatewayStrategy::OnePerAz if eip_count > 0 && eip_count != availability_zones.len() => {
                Err(NetError::InvalidEipCount(format!(
                    "The number of Elastic IPs, if specified, must match the number of availability zones \
                     for the VPC ({}) when NAT Gateway strategy is '{}'",
                    availability_zones.len(),
                    self
                )))
            }
            NatGatewayStrategy::Single if eip_count > 1 => Err(NetError::InvalidEipCount(format!(
                "Exactly one Elastic IP may be specified when NAT Gateway strategy is '{}'.",
                self
            ))),
            NatGatewayStrategy::None if eip_count > 0 => Err(NetError::InvalidEipCount(format!(
                "Elastic IP allocation IDs cannot be specified when NAT Gateway strategy is '{}'.",
                self
            ))),
            _ => Ok(()),
        }
    }

    /// Whether a gateway should be created while processing zone `az_index`.
    pub fn should_create_nat_gateway(&self, gateways_created: usize, az_index: usize) -> bool {
        match self {
            NatGatewayStrategy::OnePerAz => gateways_created < az_index + 1,
            NatGatewayStrategy::Single => gateways_created < 1,
            NatGatewayStrategy::None => false,
        }
    }
}

impl std::fmt::Display for NatGatewayStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NatGatewayStrategy {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oneperaz" => Ok(NatGatewayStrategy::OnePerAz),
            "single" => Ok(NatGatewayStrategy::Single),
            "none" => Ok(NatGatewayStrategy::None),
            _ => Err(NetError::UnknownStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for NatGatewayStrategy {
    type Error = NetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NatGatewayStrategy> for String {
    fn from(strategy: NatGatewayStrategy) -> Self {
        strategy.as_str().to_string()
    }
}
