//! Lifecycle policy rules and the policy document compiler.
//!
//! Rules are written in a simplified form (keep N images, or expire after N
//! days) and compiled into the JSON document ECR expects. Priorities are
//! assigned densely from 1, with the single `any` rule always last.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EcrError, EcrResult};

/// Which images a rule selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    Any,
    Tagged,
    Untagged,
}

/// A simplified lifecycle rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecyclePolicyRule {
    #[serde(default)]
    pub description: Option<String>,
    /// Expire images older than this many days.
    #[serde(default)]
    pub maximum_age_limit: Option<u32>,
    /// Keep at most this many images.
    #[serde(default)]
    pub maximum_number_of_images: Option<u32>,
    /// Only used with [`TagStatus::Tagged`].
    #[serde(default)]
    pub tag_prefix_list: Vec<String>,
    pub tag_status: TagStatus,
}

impl LifecyclePolicyRule {
    fn with_status(tag_status: TagStatus) -> Self {
        Self {
            description: None,
            maximum_age_limit: None,
            maximum_number_of_images: None,
            tag_prefix_list: Vec::new(),
            tag_status,
        }
    }

    pub fn any() -> Self {
        Self::with_status(TagStatus::Any)
    }

    pub fn untagged() -> Self {
        Self::with_status(TagStatus::Untagged)
    }

    pub fn tagged(prefixes: Vec<String>) -> Self {
        Self {
            tag_prefix_list: prefixes,
            ..Self::with_status(TagStatus::Tagged)
        }
    }

    pub fn keep_images(mut self, count: u32) -> Self {
        self.maximum_number_of_images = Some(count);
        self
    }

    pub fn expire_after_days(mut self, days: u32) -> Self {
        self.maximum_age_limit = Some(days);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// The rule applied when a repository declares none.
    pub fn default_untagged() -> Self {
        Self::untagged()
            .keep_images(1)
            .with_description("remove untagged images")
    }

    fn label(&self, position: usize) -> String {
        match &self.description {
            Some(desc) if !desc.is_empty() => desc.clone(),
            _ => format!("rule #{}", position + 1),
        }
    }
}

/// How a compiled rule counts images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CountType {
    ImageCountMoreThan,
    SinceImagePushed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountUnit {
    Days,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSelection {
    pub tag_status: TagStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_prefix_list: Vec<String>,
    pub count_type: CountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_unit: Option<CountUnit>,
    pub count_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Expire,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
}

/// One compiled rule of a lifecycle policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    pub rule_priority: u32,
    #[serde(default)]
    pub description: String,
    pub selection: RuleSelection,
    pub action: RuleAction,
}

/// A compiled lifecycle policy, serializable as ECR policy JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRuleDocument {
    pub rules: Vec<PolicyRule>,
}

impl PolicyRuleDocument {
    pub fn to_json(&self) -> EcrResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> EcrResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> EcrResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Compile rules into a policy document.
///
/// An empty rule list compiles to [`LifecyclePolicyRule::default_untagged`].
pub fn build_lifecycle_policy(rules: &[LifecyclePolicyRule]) -> EcrResult<PolicyRuleDocument> {
    if rules.is_empty() {
        return build_lifecycle_policy(&[LifecyclePolicyRule::default_untagged()]);
    }

    let (any_rules, other_rules): (Vec<_>, Vec<_>) = rules
        .iter()
        .enumerate()
        .partition(|(_, rule)| rule.tag_status == TagStatus::Any);

    if any_rules.len() > 1 {
        return Err(EcrError::TooManyAnyRules(any_rules.len()));
    }

    let compiled = other_rules
        .into_iter()
        .chain(any_rules)
        .enumerate()
        .map(|(i, (position, rule))| convert_rule(rule, position, i as u32 + 1))
        .collect::<EcrResult<Vec<_>>>()?;

    Ok(PolicyRuleDocument { rules: compiled })
}

/// Compile rules straight to policy JSON.
pub fn compile_lifecycle_policy(rules: &[LifecyclePolicyRule]) -> EcrResult<String> {
    build_lifecycle_policy(rules)?.to_json()
}

fn convert_rule(rule: &LifecyclePolicyRule, position: usize, rule_priority: u32) -> EcrResult<PolicyRule> {
    let (count_type, count_unit, count_number) = match (rule.maximum_number_of_images, rule.maximum_age_limit) {
        (Some(images), _) if images > 0 => (CountType::ImageCountMoreThan, None, images),
        (_, Some(days)) if days > 0 => (CountType::SinceImagePushed, Some(CountUnit::Days), days),
        _ => {
            return Err(EcrError::MissingExpiryCondition {
                rule: rule.label(position),
            })
        }
    };

    let tag_prefix_list = match rule.tag_status {
        TagStatus::Any | TagStatus::Untagged => Vec::new(),
        TagStatus::Tagged if rule.tag_prefix_list.is_empty() => {
            return Err(EcrError::MissingTagPrefixList {
                rule: rule.label(position),
            })
        }
        TagStatus::Tagged => rule.tag_prefix_list.clone(),
    };

    debug!(
        "Lifecycle rule '{}' -> priority {} ({:?} {})",
        rule.label(position),
        rule_priority,
        count_type,
        count_number
    );

    Ok(PolicyRule {
        rule_priority,
        description: rule.description.clone().unwrap_or_default(),
        selection: RuleSelection {
            tag_status: rule.tag_status,
            tag_prefix_list,
            count_type,
            count_unit,
            count_number,
        },
        action: RuleAction {
            action_type: ActionType::Expire,
        },
    })
}
