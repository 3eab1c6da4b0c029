//! Task-definition sizing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EcsResult;
use crate::fargate::{solve_fargate_capacity, FargateCapacity, FargateContainerRequest};

/// Network mode Fargate tasks must use.
pub const FARGATE_NETWORK_MODE: &str = "awsvpc";
pub const FARGATE_COMPATIBILITY: &str = "FARGATE";

/// Containers of a Fargate task plus optional task-level overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskSizingRequest {
    /// Task CPU in docker units. Computed from the containers when absent.
    pub cpu: Option<String>,
    /// Task memory in MB. Computed from the containers when absent.
    pub memory: Option<String>,
    pub containers: BTreeMap<String, FargateContainerRequest>,
}

impl TaskSizingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, name: impl Into<String>, container: FargateContainerRequest) -> Self {
        self.containers.insert(name.into(), container);
        self
    }

    pub fn with_cpu(mut self, cpu: impl Into<String>) -> Self {
        self.cpu = Some(cpu.into());
        self
    }

    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = Some(memory.into());
        self
    }
}

/// The resolved size of a Fargate task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSizing {
    pub cpu: String,
    pub memory: String,
    pub network_mode: String,
    pub requires_compatibilities: Vec<String>,
    /// The solver's pick, before any task-level override.
    pub computed: FargateCapacity,
}

/// Size a Fargate task. Explicit, non-empty task values take precedence over
/// the solver's.
pub fn size_task(request: &TaskSizingRequest) -> EcsResult<TaskSizing> {
    let containers: Vec<_> = request.containers.values().copied().collect();
    let computed = solve_fargate_capacity(&containers)?;

    let cpu = explicit(&request.cpu).unwrap_or_else(|| computed.cpu.clone());
    let memory = explicit(&request.memory).unwrap_or_else(|| computed.memory.clone());

    info!(
        "Sized Fargate task with {} container(s): cpu {} memory {}",
        containers.len(),
        cpu,
        memory
    );

    Ok(TaskSizing {
        cpu,
        memory,
        network_mode: FARGATE_NETWORK_MODE.to_string(),
        requires_compatibilities: vec![FARGATE_COMPATIBILITY.to_string()],
        computed,
    })
}

fn explicit(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web_and_sidecar() -> TaskSizingRequest {
        TaskSizingRequest::new()
            .with_container("web", FargateContainerRequest::new(768, 1536))
            .with_container("sidecar", FargateContainerRequest::new(256, 512))
    }

    #[test]
    fn test_computed_when_not_overridden() {
        let sizing = size_task(&web_and_sidecar()).unwrap();
        assert_eq!(sizing.cpu, "1024");
        assert_eq!(sizing.memory, "2048");
        assert_eq!(sizing.network_mode, "awsvpc");
        assert_eq!(sizing.requires_compatibilities, vec!["FARGATE".to_string()]);
    }

    #[test]
    fn test_explicit_values_win() {
        let sizing = size_task(&web_and_sidecar().with_cpu("2048")).unwrap();
        assert_eq!(sizing.cpu, "2048");
        assert_eq!(sizing.memory, "2048");
        assert_eq!(sizing.computed.cpu, "1024");

        let sizing = size_task(&web_and_sidecar().with_memory("8192")).unwrap();
        assert_eq!(sizing.cpu, "1024");
        assert_eq!(sizing.memory, "8192");
    }

    #[test]
    fn test_blank_override_ignored() {
        let sizing = size_task(&web_and_sidecar().with_cpu("  ")).unwrap();
        assert_eq!(sizing.cpu, "1024");
    }
}
