//! Subnet layout planning.
//!
//! Every availability zone gets an equally sized, power-of-two aligned base
//! block carved from the VPC CIDR. Inside a zone, private templates are
//! allocated first, then public templates from the block following the last
//! private subnet, then isolated templates from the block following the last
//! public (or private) subnet.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cidr::{next_pow2, Ipv4Cidr};
use crate::error::{NetError, NetResult};

/// Subnet tiers, ordered for provisioning: Private < Public < Isolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubnetType {
    Private,
    Public,
    Isolated,
}

impl SubnetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetType::Private => "Private",
            SubnetType::Public => "Public",
            SubnetType::Isolated => "Isolated",
        }
    }

    /// Case-insensitive parse.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "private" => Some(SubnetType::Private),
            "public" => Some(SubnetType::Public),
            "isolated" => Some(SubnetType::Isolated),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![SubnetType::Private, SubnetType::Public, SubnetType::Isolated]
    }
}

impl std::fmt::Display for SubnetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for SubnetType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| format!("unknown subnet type '{}'", value))
    }
}

impl From<SubnetType> for String {
    fn from(subnet_type: SubnetType) -> Self {
        subnet_type.as_str().to_string()
    }
}

/// A user-supplied subnet template, applied once per availability zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpecInput {
    /// Prefix length of each subnet created from this template.
    pub cidr_mask: u8,
    /// Template name, used in `{vpc}-{name}-{zone index}`.
    pub name: String,
    #[serde(rename = "type")]
    pub subnet_type: SubnetType,
}

impl SubnetSpecInput {
    pub fn new(name: impl Into<String>, subnet_type: SubnetType, cidr_mask: u8) -> Self {
        Self {
            cidr_mask,
            name: name.into(),
            subnet_type,
        }
    }

    pub fn private(name: impl Into<String>, cidr_mask: u8) -> Self {
        Self::new(name, SubnetType::Private, cidr_mask)
    }

    pub fn public(name: impl Into<String>, cidr_mask: u8) -> Self {
        Self::new(name, SubnetType::Public, cidr_mask)
    }

    pub fn isolated(name: impl Into<String>, cidr_mask: u8) -> Self {
        Self::new(name, SubnetType::Isolated, cidr_mask)
    }
}

/// A concrete subnet assignment produced by [`plan_subnets`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    pub cidr_block: Ipv4Cidr,
    #[serde(rename = "type")]
    pub subnet_type: SubnetType,
    pub az_name: String,
    pub subnet_name: String,
}

impl SubnetSpec {
    pub fn is_public(&self) -> bool {
        self.subnet_type == SubnetType::Public
    }

    pub fn is_private(&self) -> bool {
        self.subnet_type == SubnetType::Private
    }

    pub fn is_isolated(&self) -> bool {
        self.subnet_type == SubnetType::Isolated
    }
}

/// Plan the subnets of a VPC across `availability_zones`.
///
/// With no templates, each zone gets one private subnet (lower half of the
/// zone block) and one public subnet (lower half of the upper half). The
/// default layout lists every private subnet before every public subnet;
/// templated layouts list each zone's private, public and isolated subnets
/// zone by zone.
pub fn plan_subnets(
    vpc_name: &str,
    vpc_cidr: &Ipv4Cidr,
    availability_zones: &[String],
    templates: &[SubnetSpecInput],
) -> NetResult<Vec<SubnetSpec>> {
    if availability_zones.is_empty() {
        return Err(NetError::MissingAvailabilityZones);
    }

    let bits_per_az = next_pow2(availability_zones.len()).trailing_zeros() as u8;
    let az_bases = availability_zones
        .iter()
        .enumerate()
        .map(|(i, _)| vpc_cidr.subnet(bits_per_az, i as u32))
        .collect::<NetResult<Vec<_>>>()?;

    debug!(
        "Carved {} zone blocks of /{} from {}",
        az_bases.len(),
        az_bases[0].prefix_len(),
        vpc_cidr
    );

    if templates.is_empty() {
        return default_subnets(vpc_name, availability_zones, &az_bases);
    }

    let of_type = |subnet_type: SubnetType| -> Vec<&SubnetSpecInput> {
        templates.iter().filter(|t| t.subnet_type == subnet_type).collect()
    };
    let private_in = of_type(SubnetType::Private);
    let public_in = of_type(SubnetType::Public);
    let isolated_in = of_type(SubnetType::Isolated);

    let mut specs = Vec::with_capacity(templates.len() * availability_zones.len());

    for (i, (az_name, az_base)) in availability_zones.iter().zip(&az_bases).enumerate() {
        let zone = ZoneAllocator {
            vpc_name,
            az_name,
            zone_number: i + 1,
        };

        let private_out = zone.allocate(*az_base, &private_in)?;

        let public_base = remainder_after(private_out.last(), *az_base)?;
        let public_out = zone.allocate(public_base, &public_in)?;

        let isolated_base = remainder_after(public_out.last().or(private_out.last()), *az_base)?;
        let isolated_out = zone.allocate(isolated_base, &isolated_in)?;

        debug!(
            "Zone {}: {} private, {} public, {} isolated",
            az_name,
            private_out.len(),
            public_out.len(),
            isolated_out.len()
        );

        specs.extend(private_out);
        specs.extend(public_out);
        specs.extend(isolated_out);
    }

    validate_subnets_within(vpc_cidr, &specs)?;
    Ok(specs)
}

fn default_subnets(
    vpc_name: &str,
    availability_zones: &[String],
    az_bases: &[Ipv4Cidr],
) -> NetResult<Vec<SubnetSpec>> {
    let mut private = Vec::with_capacity(availability_zones.len());
    for (i, (az_name, az_base)) in availability_zones.iter().zip(az_bases).enumerate() {
        private.push(SubnetSpec {
            cidr_block: az_base.subnet(1, 0)?,
            subnet_type: SubnetType::Private,
            az_name: az_name.clone(),
            subnet_name: format!("{}-private-{}", vpc_name, i + 1),
        });
    }

    let mut public = Vec::with_capacity(availability_zones.len());
    for (i, private_spec) in private.iter().enumerate() {
        let split_base = private_spec.cidr_block.subnet(0, 1)?;
        public.push(SubnetSpec {
            cidr_block: split_base.subnet(1, 0)?,
            subnet_type: SubnetType::Public,
            az_name: private_spec.az_name.clone(),
            subnet_name: format!("{}-public-{}", vpc_name, i + 1),
        });
    }

    private.extend(public);
    Ok(private)
}

/// The block following `last`, or the zone base when nothing was allocated yet.
fn remainder_after(last: Option<&SubnetSpec>, az_base: Ipv4Cidr) -> NetResult<Ipv4Cidr> {
    match last {
        Some(spec) => spec.cidr_block.subnet(0, 1),
        None => Ok(az_base),
    }
}

struct ZoneAllocator<'a> {
    vpc_name: &'a str,
    az_name: &'a str,
    zone_number: usize,
}

impl ZoneAllocator<'_> {
    fn allocate(&self, base: Ipv4Cidr, templates: &[&SubnetSpecInput]) -> NetResult<Vec<SubnetSpec>> {
        templates
            .iter()
            .enumerate()
            .map(|(j, template)| {
                let bits = template.cidr_mask.checked_sub(base.prefix_len()).ok_or_else(|| {
                    NetError::NegativeBitWidth {
                        name: template.name.clone(),
                        mask: template.cidr_mask,
                        base: base.prefix_len(),
                    }
                })?;

                Ok(SubnetSpec {
                    cidr_block: base.subnet(bits, j as u32)?,
                    subnet_type: template.subnet_type,
                    az_name: self.az_name.to_string(),
                    subnet_name: format!("{}-{}-{}", self.vpc_name, template.name, self.zone_number),
                })
            })
            .collect()
    }
}

/// Every spec that overlaps at least one other spec, in input order.
pub fn get_overlapping_subnets(specs: &[SubnetSpec]) -> Vec<SubnetSpec> {
    specs
        .iter()
        .enumerate()
        .filter(|(i, x)| {
            specs
                .iter()
                .enumerate()
                .any(|(j, y)| *i != j && x.cidr_block.overlaps(&y.cidr_block))
        })
        .map(|(_, spec)| spec.clone())
        .collect()
}

/// Reject a plan in which any two subnets overlap.
pub fn validate_subnet_plan(specs: &[SubnetSpec]) -> NetResult<()> {
    let overlapping = get_overlapping_subnets(specs);
    if overlapping.is_empty() {
        Ok(())
    } else {
        Err(NetError::OverlappingSubnets(overlapping))
    }
}

/// Reject the first subnet that does not lie entirely inside `vpc_cidr`.
///
/// Public and isolated tiers start in the block after the previous tier, which
/// can run past the end of the VPC when templates are too large.
pub fn validate_subnets_within(vpc_cidr: &Ipv4Cidr, specs: &[SubnetSpec]) -> NetResult<()> {
    match specs.iter().find(|spec| !vpc_cidr.contains_block(&spec.cidr_block)) {
        Some(spec) => Err(NetError::SubnetOutsideVpc {
            name: spec.subnet_name.clone(),
            cidr: spec.cidr_block,
            vpc: *vpc_cidr,
        }),
        None => Ok(()),
    }
}

/// Stable sort into provisioning order: Private, Public, Isolated.
pub fn sort_for_provisioning(specs: &mut [SubnetSpec]) {
    specs.sort_by_key(|spec| spec.subnet_type);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones(n: usize) -> Vec<String> {
        ["us-east-1a", "us-east-1b", "us-east-1c", "us-east-1d", "us-east-1e"]
            .iter()
            .take(n)
            .map(|z| z.to_string())
            .collect()
    }

    fn vpc() -> Ipv4Cidr {
        Ipv4Cidr::parse("10.0.0.0/16").unwrap()
    }

    fn blocks(specs: &[SubnetSpec]) -> Vec<String> {
        specs.iter().map(|s| s.cidr_block.to_string()).collect()
    }

    #[test]
    fn test_subnet_type_parsing() {
        assert_eq!(SubnetType::from_str("PRIVATE"), Some(SubnetType::Private));
        assert_eq!(SubnetType::from_str("public"), Some(SubnetType::Public));
        assert_eq!(SubnetType::from_str("Isolated"), Some(SubnetType::Isolated));
        assert_eq!(SubnetType::from_str("dmz"), None);
    }

    #[test]
    fn test_default_layout_three_zones() {
        let specs = plan_subnets("main", &vpc(), &zones(3), &[]).unwrap();

        assert_eq!(
            blocks(&specs),
            vec![
                "10.0.0.0/19",
                "10.0.64.0/19",
                "10.0.128.0/19",
                "10.0.32.0/20",
                "10.0.96.0/20",
                "10.0.160.0/20",
            ]
        );
        assert_eq!(specs[0].subnet_name, "main-private-1");
        assert_eq!(specs[3].subnet_name, "main-public-1");
        assert_eq!(specs[5].az_name, "us-east-1c");
        assert!(specs[..3].iter().all(|s| s.is_private()));
        assert!(specs[3..].iter().all(|s| s.is_public()));
    }

    #[test]
    fn test_default_layout_single_zone() {
        let specs = plan_subnets("solo", &vpc(), &zones(1), &[]).unwrap();
        assert_eq!(blocks(&specs), vec!["10.0.0.0/17", "10.0.128.0/18"]);
    }

    #[test]
    fn test_zero_zones_rejected() {
        let err = plan_subnets("main", &vpc(), &[], &[]).unwrap_err();
        assert_eq!(err, NetError::MissingAvailabilityZones);
    }

    #[test]
    fn test_templates_layered_per_zone() {
        let templates = vec![
            SubnetSpecInput::private("app", 20),
            SubnetSpecInput::public("edge", 22),
            SubnetSpecInput::isolated("db", 24),
        ];

        let specs = plan_subnets("main", &vpc(), &zones(2), &templates).unwrap();

        // Zone blocks are /17; public splits from the /20 after the private subnet,
        // isolated from the /22 after the public subnet.
        assert_eq!(
            blocks(&specs),
            vec![
                "10.0.0.0/20",
                "10.0.16.0/22",
                "10.0.20.0/24",
                "10.0.128.0/20",
                "10.0.144.0/22",
                "10.0.148.0/24",
            ]
        );
        assert_eq!(specs[1].subnet_name, "main-edge-1");
        assert_eq!(specs[5].subnet_name, "main-db-2");
        validate_subnet_plan(&specs).unwrap();
    }

    #[test]
    fn test_multiple_private_templates_are_indexed() {
        let templates = vec![
            SubnetSpecInput::private("web", 20),
            SubnetSpecInput::private("worker", 20),
            SubnetSpecInput::public("ingress", 20),
        ];

        let specs = plan_subnets("main", &vpc(), &zones(1), &templates).unwrap();

        assert_eq!(blocks(&specs), vec!["10.0.0.0/20", "10.0.16.0/20", "10.0.32.0/20"]);
        validate_subnet_plan(&specs).unwrap();
    }

    #[test]
    fn test_isolated_without_public_follows_private() {
        let templates = vec![
            SubnetSpecInput::isolated("db", 24),
            SubnetSpecInput::private("app", 24),
        ];

        let specs = plan_subnets("main", &vpc(), &zones(1), &templates).unwrap();

        assert_eq!(specs[0].subnet_type, SubnetType::Private);
        assert_eq!(blocks(&specs), vec!["10.0.0.0/24", "10.0.1.0/24"]);
    }

    #[test]
    fn test_public_only_uses_zone_base() {
        let templates = vec![SubnetSpecInput::public("edge", 24)];
        let specs = plan_subnets("main", &vpc(), &zones(4), &templates).unwrap();

        assert_eq!(
            blocks(&specs),
            vec!["10.0.0.0/24", "10.0.64.0/24", "10.0.128.0/24", "10.0.192.0/24"]
        );
    }

    #[test]
    fn test_mask_larger_than_zone_block() {
        let templates = vec![SubnetSpecInput::private("huge", 16)];
        let err = plan_subnets("main", &vpc(), &zones(3), &templates).unwrap_err();

        assert_eq!(
            err,
            NetError::NegativeBitWidth {
                name: "huge".to_string(),
                mask: 16,
                base: 18,
            }
        );
    }

    #[test]
    fn test_tier_spilling_past_vpc_rejected() {
        // The private template takes the whole /16, so the public tier would
        // start at 10.1.0.0.
        let templates = vec![SubnetSpecInput::private("app", 16), SubnetSpecInput::public("edge", 24)];
        let err = plan_subnets("main", &vpc(), &zones(1), &templates).unwrap_err();

        assert_eq!(
            err,
            NetError::SubnetOutsideVpc {
                name: "main-edge-1".to_string(),
                cidr: Ipv4Cidr::parse("10.1.0.0/24").unwrap(),
                vpc: vpc(),
            }
        );
        assert!(err.to_string().contains("main-edge-1"));
    }

    #[test]
    fn test_isolated_spilling_past_vpc_rejected() {
        let templates = vec![
            SubnetSpecInput::private("app", 17),
            SubnetSpecInput::public("edge", 17),
            SubnetSpecInput::isolated("db", 24),
        ];
        let err = plan_subnets("main", &vpc(), &zones(1), &templates).unwrap_err();
        assert!(matches!(err, NetError::SubnetOutsideVpc { ref name, .. } if name == "main-db-1"));
    }

    #[test]
    fn test_validate_subnets_within_accepts_contained() {
        let specs = plan_subnets("main", &vpc(), &zones(3), &[]).unwrap();
        validate_subnets_within(&vpc(), &specs).unwrap();
        assert!(validate_subnets_within(&Ipv4Cidr::parse("10.0.0.0/17").unwrap(), &specs).is_err());
    }

    #[test]
    fn test_overlap_detection_accumulates() {
        let make = |name: &str, cidr: &str| SubnetSpec {
            cidr_block: Ipv4Cidr::parse(cidr).unwrap(),
            subnet_type: SubnetType::Private,
            az_name: "us-east-1a".to_string(),
            subnet_name: name.to_string(),
        };

        // "a" overlaps "b" only; it must still be flagged even though the
        // final comparison in its scan ("c") does not overlap.
        let specs = vec![
            make("a", "10.0.0.0/24"),
            make("b", "10.0.0.0/25"),
            make("c", "10.0.5.0/24"),
        ];

        let overlapping = get_overlapping_subnets(&specs);
        let names: Vec<_> = overlapping.iter().map(|s| s.subnet_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let err = validate_subnet_plan(&specs).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1. a: 10.0.0.0/24"));
        assert!(message.contains("2. b: 10.0.0.0/25"));
    }

    #[test]
    fn test_sort_for_provisioning_is_stable() {
        let templates = vec![
            SubnetSpecInput::isolated("db", 24),
            SubnetSpecInput::public("edge-a", 24),
            SubnetSpecInput::private("app", 24),
            SubnetSpecInput::public("edge-b", 24),
        ];
        let mut specs = plan_subnets("main", &vpc(), &zones(1), &templates).unwrap();
        specs.reverse();

        sort_for_provisioning(&mut specs);

        let names: Vec<_> = specs.iter().map(|s| s.subnet_name.as_str()).collect();
        assert_eq!(names, vec!["main-app-1", "main-edge-b-1", "main-edge-a-1", "main-db-1"]);
    }

    #[test]
    fn test_spec_input_yaml() {
        let input: SubnetSpecInput = serde_yaml::from_str("cidrMask: 24\nname: app\ntype: private\n").unwrap();
        assert_eq!(input, SubnetSpecInput::private("app", 24));
    }
}
