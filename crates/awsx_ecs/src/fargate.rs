//! Fargate capacity tiers and the cheapest-fit solver.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EcsError, EcsResult};

/// Largest vCPU count a Fargate task can request.
pub const MAX_FARGATE_VCPU: f64 = 4.0;
/// Largest memory, in GB, a Fargate task can request.
pub const MAX_FARGATE_MEMORY_GB: f64 = 30.0;

const VCPU_HOURLY_PRICE: f64 = 0.04048;
const GB_HOURLY_PRICE: f64 = 0.004445;

/// Docker CPU units per vCPU, and MB per GB.
const UNITS_PER_WHOLE: f64 = 1024.0;

/// Valid memory sizes (GB) for each vCPU band.
const FARGATE_BANDS: &[(f64, &[f64])] = &[
    (0.25, &[0.5, 1.0, 2.0]),
    (0.5, &[1.0, 2.0, 3.0, 4.0]),
    (1.0, &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
    (
        2.0,
        &[4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0],
    ),
    (
        4.0,
        &[
            8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0, 23.0, 24.0,
            25.0, 26.0, 27.0, 28.0, 29.0, 30.0,
        ],
    ),
];

/// CPU and memory a single container asks for, in docker CPU units and MB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FargateContainerRequest {
    pub cpu: Option<u32>,
    pub memory: Option<u32>,
    pub memory_reservation: Option<u32>,
}

impl FargateContainerRequest {
    pub fn new(cpu: u32, memory: u32) -> Self {
        Self {
            cpu: Some(cpu),
            memory: Some(memory),
            memory_reservation: None,
        }
    }

    pub fn with_memory_reservation(mut self, mb: u32) -> Self {
        self.memory_reservation = Some(mb);
        self
    }

    /// Memory counted towards the task: the reservation when set, else the hard limit.
    fn effective_memory_mb(&self) -> u32 {
        match (self.memory_reservation, self.memory) {
            (Some(reserved), _) if reserved > 0 => reserved,
            (_, Some(memory)) => memory,
            _ => 0,
        }
    }
}

/// One billable (vCPU, memory) combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FargateCapacityTier {
    pub vcpu: f64,
    pub mem_gb: f64,
    pub cost: f64,
}

impl FargateCapacityTier {
    fn new(vcpu: f64, mem_gb: f64) -> Self {
        Self {
            vcpu,
            mem_gb,
            cost: fargate_cost(vcpu, mem_gb),
        }
    }

    pub fn satisfies(&self, vcpu: f64, mem_gb: f64) -> bool {
        self.vcpu >= vcpu && self.mem_gb >= mem_gb
    }
}

/// Aggregate requirement of a set of containers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestedCapacity {
    pub vcpu: f64,
    pub mem_gb: f64,
}

/// Task-level CPU and memory, as the decimal strings ECS expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FargateCapacity {
    /// Docker CPU units, e.g. `"512"`.
    pub cpu: String,
    /// Memory in MB, e.g. `"1024"`.
    pub memory: String,
}

pub fn fargate_cost(vcpu: f64, mem_gb: f64) -> f64 {
    VCPU_HOURLY_PRICE * vcpu + GB_HOURLY_PRICE * mem_gb
}

/// Every tier, cheapest first. Ties keep band order.
pub fn fargate_tiers() -> Vec<FargateCapacityTier> {
    let mut tiers: Vec<_> = FARGATE_BANDS
        .iter()
        .flat_map(|(vcpu, memory)| memory.iter().map(move |mem_gb| FargateCapacityTier::new(*vcpu, *mem_gb)))
        .collect();

    tiers.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    tiers
}

/// Sum the containers' CPU and memory and convert to vCPU and GB.
pub fn requested_capacity(containers: &[FargateContainerRequest]) -> RequestedCapacity {
    let (cpu_units, memory_mb) = containers.iter().fold((0u64, 0u64), |(cpu, mem), c| {
        (
            cpu + u64::from(c.cpu.unwrap_or(0)),
            mem + u64::from(c.effective_memory_mb()),
        )
    });

    RequestedCapacity {
        vcpu: cpu_units as f64 / UNITS_PER_WHOLE,
        mem_gb: memory_mb as f64 / UNITS_PER_WHOLE,
    }
}

/// Pick the cheapest tier that covers the containers' combined request.
///
/// Requests beyond the platform maximum are clamped to it.
pub fn solve_fargate_capacity(containers: &[FargateContainerRequest]) -> EcsResult<FargateCapacity> {
    let requested = requested_capacity(containers);

    let vcpu = requested.vcpu.min(MAX_FARGATE_VCPU);
    let mem_gb = requested.mem_gb.min(MAX_FARGATE_MEMORY_GB);
    if vcpu < requested.vcpu || mem_gb < requested.mem_gb {
        warn!(
            "Requested {} vCPU / {}GB exceeds Fargate limits, clamping to {} vCPU / {}GB",
            requested.vcpu, requested.mem_gb, vcpu, mem_gb
        );
    }

    let tier = fargate_tiers()
        .into_iter()
        .find(|tier| tier.satisfies(vcpu, mem_gb))
        .ok_or(EcsError::NoCapacityFit { vcpu, mem_gb })?;

    debug!(
        "Selected Fargate tier {} vCPU / {}GB for {} vCPU / {}GB",
        tier.vcpu, tier.mem_gb, vcpu, mem_gb
    );

    Ok(FargateCapacity {
        cpu: to_units(tier.vcpu),
        memory: to_units(tier.mem_gb),
    })
}

fn to_units(value: f64) -> String {
    format!("{}", (value * UNITS_PER_WHOLE).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_table_shape() {
        let tiers = fargate_tiers();
        assert_eq!(tiers.len(), 50);

        for pair in tiers.windows(2) {
            assert!(pair[0].cost <= pair[1].cost);
        }

        assert_eq!((tiers[0].vcpu, tiers[0].mem_gb), (0.25, 0.5));
        let last = tiers.last().unwrap();
        assert_eq!((last.vcpu, last.mem_gb), (4.0, 30.0));
    }

    #[test]
    fn test_bands_have_expected_sizes() {
        let sizes: Vec<_> = FARGATE_BANDS.iter().map(|(_, mem)| mem.len()).collect();
        assert_eq!(sizes, vec![3, 4, 7, 13, 23]);
    }

    #[test]
    fn test_reservation_preferred_over_memory() {
        let containers = vec![
            FargateContainerRequest::new(256, 2048).with_memory_reservation(512),
            FargateContainerRequest::new(256, 512),
        ];
        let requested = requested_capacity(&containers);
        assert_eq!(requested.vcpu, 0.5);
        assert_eq!(requested.mem_gb, 1.0);
    }

    #[test]
    fn test_zero_reservation_falls_back_to_memory() {
        let container = FargateContainerRequest::new(0, 1024).with_memory_reservation(0);
        assert_eq!(requested_capacity(&[container]).mem_gb, 1.0);
    }

    #[test]
    fn test_half_vcpu_one_gb() {
        let capacity = solve_fargate_capacity(&[FargateContainerRequest::new(512, 1024)]).unwrap();
        assert_eq!(capacity.cpu, "512");
        assert_eq!(capacity.memory, "1024");
    }

    #[test]
    fn test_empty_request_takes_smallest_tier() {
        let capacity = solve_fargate_capacity(&[]).unwrap();
        assert_eq!(capacity.cpu, "256");
        assert_eq!(capacity.memory, "512");
    }

    #[test]
    fn test_memory_heavy_request_picks_cheapest_band() {
        // 0.25 vCPU but 4GB: the 0.5 band is the cheapest that holds 4GB.
        let capacity = solve_fargate_capacity(&[FargateContainerRequest::new(256, 4096)]).unwrap();
        assert_eq!(capacity.cpu, "512");
        assert_eq!(capacity.memory, "4096");
    }

    #[test]
    fn test_oversized_request_clamps() {
        let containers = vec![FargateContainerRequest::new(8192, 40960); 2];
        let capacity = solve_fargate_capacity(&containers).unwrap();
        assert_eq!(capacity.cpu, "4096");
        assert_eq!(capacity.memory, "30720");
    }
}
