//! VPC planning: zone resolution, subnet layout, NAT gateways and routes.
//!
//! [`VpcPlanner`] turns user-facing [`VpcArgs`] into a fully resolved
//! [`VpcPlan`]. Nothing here talks to a cloud API; the region's zones come
//! from an [`AvailabilityZoneSource`] supplied by the caller.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cidr::Ipv4Cidr;
use crate::error::{NetError, NetResult};
use crate::nat::NatGatewayStrategy;
use crate::subnet::{plan_subnets, sort_for_provisioning, validate_subnet_plan, SubnetSpec, SubnetSpecInput};

/// CIDR used when the caller does not supply one.
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";

/// Zone count used when neither names nor a count are supplied.
pub const DEFAULT_AVAILABILITY_ZONE_COUNT: usize = 3;

/// Destination of every default route.
pub const DEFAULT_ROUTE_DESTINATION: &str = "0.0.0.0/0";

/// Supplies the availability zones of the target region.
#[cfg_attr(test, mockall::automock)]
pub trait AvailabilityZoneSource: Send + Sync {
    fn availability_zones(&self) -> NetResult<Vec<String>>;
}

/// A fixed list of zones, e.g. read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticZones {
    zones: Vec<String>,
}

impl StaticZones {
    pub fn new(zones: Vec<String>) -> Self {
        Self { zones }
    }
}

impl AvailabilityZoneSource for StaticZones {
    fn availability_zones(&self) -> NetResult<Vec<String>> {
        Ok(self.zones.clone())
    }
}

/// NAT gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NatGatewayArgs {
    pub strategy: NatGatewayStrategy,
    pub elastic_ip_allocation_ids: Vec<String>,
}

/// User input for a VPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VpcArgs {
    pub cidr_block: Option<Ipv4Cidr>,
    pub availability_zone_names: Vec<String>,
    pub number_of_availability_zones: Option<usize>,
    pub subnet_specs: Vec<SubnetSpecInput>,
    pub nat_gateways: NatGatewayArgs,
    pub tags: BTreeMap<String, String>,
}

impl VpcArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cidr_block(mut self, cidr: Ipv4Cidr) -> Self {
        self.cidr_block = Some(cidr);
        self
    }

    pub fn with_zone_names(mut self, zones: Vec<String>) -> Self {
        self.availability_zone_names = zones;
        self
    }

    pub fn with_zone_count(mut self, count: usize) -> Self {
        self.number_of_availability_zones = Some(count);
        self
    }

    pub fn with_subnet(mut self, spec: SubnetSpecInput) -> Self {
        self.subnet_specs.push(spec);
        self
    }

    pub fn with_nat_strategy(mut self, strategy: NatGatewayStrategy) -> Self {
        self.nat_gateways.strategy = strategy;
        self
    }

    pub fn with_elastic_ips(mut self, allocation_ids: Vec<String>) -> Self {
        self.nat_gateways.elastic_ip_allocation_ids = allocation_ids;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Where a NAT gateway's Elastic IP comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EipAllocation {
    /// A user-supplied allocation id.
    #[serde(rename_all = "camelCase")]
    Existing { allocation_id: String },
    /// A new Elastic IP to allocate.
    #[serde(rename_all = "camelCase")]
    New { eip_name: String },
}

/// A NAT gateway to create inside a public subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatGatewayPlacement {
    pub name: String,
    pub az_index: usize,
    pub az_name: String,
    pub subnet_name: String,
    pub allocation: EipAllocation,
}

/// Where a subnet's default route points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum RouteTarget {
    InternetGateway(String),
    NatGateway(String),
}

/// The default route of one subnet's route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub route_table_name: String,
    pub subnet_name: String,
    pub destination_cidr_block: String,
    pub target: RouteTarget,
}

/// A fully resolved VPC layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcPlan {
    pub name: String,
    pub cidr_block: Ipv4Cidr,
    pub availability_zones: Vec<String>,
    pub nat_strategy: NatGatewayStrategy,
    pub tags: BTreeMap<String, String>,
    pub internet_gateway_name: String,
    /// Subnets zone by zone, each zone in provisioning order.
    pub subnets: Vec<SubnetSpec>,
    pub nat_gateways: Vec<NatGatewayPlacement>,
    pub routes: Vec<RoutePlan>,
}

impl VpcPlan {
    pub fn public_subnet_names(&self) -> Vec<&str> {
        self.names_where(SubnetSpec::is_public)
    }

    pub fn private_subnet_names(&self) -> Vec<&str> {
        self.names_where(SubnetSpec::is_private)
    }

    pub fn isolated_subnet_names(&self) -> Vec<&str> {
        self.names_where(SubnetSpec::is_isolated)
    }

    fn names_where(&self, pred: fn(&SubnetSpec) -> bool) -> Vec<&str> {
        self.subnets
            .iter()
            .filter(|s| pred(s))
            .map(|s| s.subnet_name.as_str())
            .collect()
    }
}

/// Plans VPCs against a source of availability zones.
pub struct VpcPlanner {
    zones: Arc<dyn AvailabilityZoneSource>,
}

impl VpcPlanner {
    pub fn new(zones: Arc<dyn AvailabilityZoneSource>) -> Self {
        Self { zones }
    }

    /// Resolve, validate and lay out a VPC named `name`.
    pub fn plan(&self, name: &str, args: &VpcArgs) -> NetResult<VpcPlan> {
        let zones = self.resolve_zones(args)?;
        let strategy = args.nat_gateways.strategy;
        let allocation_ids = &args.nat_gateways.elastic_ip_allocation_ids;

        strategy.validate_eips(allocation_ids, &zones)?;

        let cidr_block = match args.cidr_block {
            Some(cidr) => cidr,
            None => Ipv4Cidr::parse(DEFAULT_VPC_CIDR)?,
        };

        let specs = plan_subnets(name, &cidr_block, &zones, &args.subnet_specs)?;
        validate_subnet_plan(&specs)?;
        strategy.validate_strategy(&specs)?;

        let mut by_zone: Vec<Vec<SubnetSpec>> = Vec::with_capacity(zones.len());
        let mut nat_gateways: Vec<NatGatewayPlacement> = Vec::new();

        for (i, zone) in zones.iter().enumerate() {
            let mut zone_specs: Vec<SubnetSpec> =
                specs.iter().filter(|s| &s.az_name == zone).cloned().collect();
            sort_for_provisioning(&mut zone_specs);

            for spec in zone_specs.iter().filter(|s| s.is_public()) {
                if !strategy.should_create_nat_gateway(nat_gateways.len(), i) {
                    continue;
                }

                let allocation = match allocation_ids.get(nat_gateways.len()) {
                    Some(id) => EipAllocation::Existing {
                        allocation_id: id.clone(),
                    },
                    None => EipAllocation::New {
                        eip_name: format!("{}-{}", name, i + 1),
                    },
                };

                let placement = NatGatewayPlacement {
                    name: format!("{}-nat-gateway-{}", name, i + 1),
                    az_index: i,
                    az_name: zone.clone(),
                    subnet_name: spec.subnet_name.clone(),
                    allocation,
                };
                debug!("NAT gateway {} placed in {}", placement.name, placement.subnet_name);
                nat_gateways.push(placement);
            }

            by_zone.push(zone_specs);
        }

        let mut routes = Vec::new();
        for (i, zone_specs) in by_zone.iter().enumerate() {
            for spec in zone_specs {
                let target = if spec.is_public() {
                    RouteTarget::InternetGateway(name.to_string())
                } else if spec.is_private() {
                    let gateway = match strategy {
                        NatGatewayStrategy::Single => nat_gateways.first(),
                        _ => nat_gateways.iter().find(|g| g.az_index == i),
                    };
                    let gateway = gateway.ok_or_else(|| {
                        NetError::InvalidTopologyForStrategy(format!(
                            "no NAT Gateway is available for private subnet '{}'",
                            spec.subnet_name
                        ))
                    })?;
                    RouteTarget::NatGateway(gateway.name.clone())
                } else {
                    continue;
                };

                routes.push(RoutePlan {
                    route_table_name: spec.subnet_name.clone(),
                    subnet_name: spec.subnet_name.clone(),
                    destination_cidr_block: DEFAULT_ROUTE_DESTINATION.to_string(),
                    target,
                });
            }
        }

        let mut tags = BTreeMap::from([("Name".to_string(), name.to_string())]);
        tags.extend(args.tags.iter().map(|(k, v)| (k.clone(), v.clone())));

        let plan = VpcPlan {
            name: name.to_string(),
            cidr_block,
            availability_zones: zones,
            nat_strategy: strategy,
            tags,
            internet_gateway_name: name.to_string(),
            subnets: by_zone.into_iter().flatten().collect(),
            nat_gateways,
            routes,
        };

        info!(
            "Planned VPC {} ({}): {} subnets across {} zones, {} NAT gateways",
            plan.name,
            plan.cidr_block,
            plan.subnets.len(),
            plan.availability_zones.len(),
            plan.nat_gateways.len()
        );

        Ok(plan)
    }

    fn resolve_zones(&self, args: &VpcArgs) -> NetResult<Vec<String>> {
        let requested = args.number_of_availability_zones.filter(|n| *n > 0);

        if !args.availability_zone_names.is_empty() {
            if requested.is_some() {
                return Err(NetError::ConflictingZoneSelection);
            }
            let zones = args.availability_zone_names.clone();
            ensure_unique_zones(&zones)?;
            return Ok(zones);
        }

        let desired = requested.unwrap_or(DEFAULT_AVAILABILITY_ZONE_COUNT);
        let available = self.zones.availability_zones()?;
        if available.len() < desired {
            return Err(NetError::InsufficientAvailabilityZones {
                desired,
                available: available.len(),
            });
        }

        debug!("Using {} of {} region zones", desired, available.len());
        let zones: Vec<String> = available.into_iter().take(desired).collect();
        ensure_unique_zones(&zones)?;
        Ok(zones)
    }
}

/// Subnets are regrouped by zone name, so every zone may appear only once.
fn ensure_unique_zones(zones: &[String]) -> NetResult<()> {
    let mut seen = BTreeSet::new();
    match zones.iter().find(|zone| !seen.insert(zone.as_str())) {
        Some(duplicate) => Err(NetError::DuplicateAvailabilityZone(duplicate.clone())),
        None => Ok(()),
    }
}
