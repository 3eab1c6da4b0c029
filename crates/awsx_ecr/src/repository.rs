//! Repository planning.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EcrError, EcrResult};
use crate::lifecycle::{build_lifecycle_policy, LifecyclePolicyRule};

/// Repository names: lowercase path segments separated by `/`, each made of
/// alphanumeric runs joined by `.`, `_` or `-`.
const REPOSITORY_NAME_PATTERN: &str = r"^(?:[a-z0-9]+(?:[._-][a-z0-9]+)*/)*[a-z0-9]+(?:[._-][a-z0-9]+)*$";
const REPOSITORY_NAME_MIN_LEN: usize = 2;
const REPOSITORY_NAME_MAX_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageTagMutability {
    #[default]
    Mutable,
    Immutable,
}

impl ImageTagMutability {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageTagMutability::Mutable => "MUTABLE",
            ImageTagMutability::Immutable => "IMMUTABLE",
        }
    }
}

impl std::fmt::Display for ImageTagMutability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle settings for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifecyclePolicyArgs {
    /// Leave the repository without a lifecycle policy.
    pub skip: bool,
    pub rules: Vec<LifecyclePolicyRule>,
}

/// Arguments for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryArgs {
    /// Explicit repository name. Defaults to the lowercased resource name.
    pub name: Option<String>,
    pub image_tag_mutability: ImageTagMutability,
    pub tags: BTreeMap<String, String>,
    pub lifecycle_policy: LifecyclePolicyArgs,
}

impl RepositoryArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_immutable_tags(mut self) -> Self {
        self.image_tag_mutability = ImageTagMutability::Immutable;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_rule(mut self, rule: LifecyclePolicyRule) -> Self {
        self.lifecycle_policy.rules.push(rule);
        self
    }

    pub fn without_lifecycle_policy(mut self) -> Self {
        self.lifecycle_policy.skip = true;
        self
    }
}

/// A planned repository and its compiled lifecycle policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPlan {
    pub resource_name: String,
    pub repository_name: String,
    pub image_tag_mutability: ImageTagMutability,
    pub tags: BTreeMap<String, String>,
    /// Policy JSON, absent when the lifecycle policy is skipped.
    pub lifecycle_policy: Option<String>,
}

/// Check a repository name against the ECR naming rules.
pub fn validate_repository_name(name: &str) -> EcrResult<()> {
    if !(REPOSITORY_NAME_MIN_LEN..=REPOSITORY_NAME_MAX_LEN).contains(&name.len()) {
        return Err(EcrError::InvalidRepositoryName(format!(
            "'{}' must be between {} and {} characters",
            name, REPOSITORY_NAME_MIN_LEN, REPOSITORY_NAME_MAX_LEN
        )));
    }

    let pattern = Regex::new(REPOSITORY_NAME_PATTERN)?;
    if !pattern.is_match(name) {
        return Err(EcrError::InvalidRepositoryName(format!(
            "'{}' must match {}",
            name, REPOSITORY_NAME_PATTERN
        )));
    }

    Ok(())
}

/// Plan a repository.
///
/// Repository names must be lowercase, so the resource name is lowercased
/// before it is used as the default repository name.
pub fn plan_repository(name: &str, args: &RepositoryArgs) -> EcrResult<RepositoryPlan> {
    let resource_name = name.to_lowercase();
    let repository_name = args
        .name
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_else(|| resource_name.clone());

    validate_repository_name(&repository_name)?;

    let lifecycle_policy = if args.lifecycle_policy.skip {
        debug!("Skipping lifecycle policy for repository {}", repository_name);
        None
    } else {
        let document = build_lifecycle_policy(&args.lifecycle_policy.rules)?;
        debug!(
            "Compiled {} lifecycle rule(s) for repository {}",
            document.rules.len(),
            repository_name
        );
        Some(document.to_json()?)
    };

    info!(
        "Planned repository {} ({}, lifecycle policy: {})",
        repository_name,
        args.image_tag_mutability,
        if lifecycle_policy.is_some() { "yes" } else { "no" }
    );

    Ok(RepositoryPlan {
        resource_name,
        repository_name,
        image_tag_mutability: args.image_tag_mutability,
        tags: args.tags.clone(),
        lifecycle_policy,
    })
}
