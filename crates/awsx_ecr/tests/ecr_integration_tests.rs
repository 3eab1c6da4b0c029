//! Integration tests for lifecycle policy compilation.

use awsx_ecr::{
    build_lifecycle_policy, compile_lifecycle_policy, plan_repository, CountType, EcrError, ImageTagMutability,
    LifecyclePolicyRule, PolicyRuleDocument, RepositoryArgs, TagStatus,
};

#[test]
fn test_priorities_dense_with_any_last() {
    let rules = vec![
        LifecyclePolicyRule::any().keep_images(50),
        LifecyclePolicyRule::tagged(vec!["feature-".into()]).expire_after_days(14),
        LifecyclePolicyRule::untagged().keep_images(1),
        LifecyclePolicyRule::tagged(vec!["v".into()]).keep_images(30),
    ];

    let doc = build_lifecycle_policy(&rules).unwrap();

    let priorities: Vec<_> = doc.rules.iter().map(|r| r.rule_priority).collect();
    assert_eq!(priorities, vec![1, 2, 3, 4]);
    assert_eq!(doc.rules.last().unwrap().selection.tag_status, TagStatus::Any);
    assert!(doc.rules[..3].iter().all(|r| r.selection.tag_status != TagStatus::Any));
}

#[test]
fn test_compiled_json_round_trips() {
    let rules = vec![
        LifecyclePolicyRule::untagged().expire_after_days(3),
        LifecyclePolicyRule::tagged(vec!["release".into()]).keep_images(10),
    ];

    let json = compile_lifecycle_policy(&rules).unwrap();
    let doc = PolicyRuleDocument::from_json(&json).unwrap();

    assert_eq!(doc.rules.len(), 2);
    assert_eq!(doc.rules[0].selection.count_type, CountType::SinceImagePushed);
    assert_eq!(doc.rules[1].selection.tag_prefix_list, vec!["release".to_string()]);
    assert_eq!(doc, build_lifecycle_policy(&rules).unwrap());
}

#[test]
fn test_zero_rules_json() {
    let json = compile_lifecycle_policy(&[]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(
        value,
        serde_json::json!({
            "rules": [{
                "rulePriority": 1,
                "description": "remove untagged images",
                "selection": {
                    "tagStatus": "untagged",
                    "countType": "imageCountMoreThan",
                    "countNumber": 1
                },
                "action": { "type": "expire" }
            }]
        })
    );
}

#[test]
fn test_second_any_rule_rejected() {
    let rules = vec![
        LifecyclePolicyRule::any().keep_images(5),
        LifecyclePolicyRule::untagged().keep_images(1),
        LifecyclePolicyRule::any().expire_after_days(30),
    ];
    let err = compile_lifecycle_policy(&rules).unwrap_err();
    assert!(matches!(err, EcrError::TooManyAnyRules(2)));
    assert!(err.to_string().contains("At most one"));
}

#[test]
fn test_repository_from_yaml() {
    let yaml = r#"
imageTagMutability: IMMUTABLE
tags:
  team: platform
lifecyclePolicy:
  rules:
    - tagStatus: tagged
      tagPrefixList: [prod]
      maximumNumberOfImages: 25
    - tagStatus: any
      maximumAgeLimit: 180
      description: stale
"#;
    let args: RepositoryArgs = serde_yaml::from_str(yaml).unwrap();
    let plan = plan_repository("Payments", &args).unwrap();

    assert_eq!(plan.repository_name, "payments");
    assert_eq!(plan.image_tag_mutability, ImageTagMutability::Immutable);
    assert_eq!(plan.tags.get("team").map(String::as_str), Some("platform"));

    let doc = PolicyRuleDocument::from_json(plan.lifecycle_policy.as_deref().unwrap()).unwrap();
    assert_eq!(doc.rules[1].description, "stale");
    assert_eq!(doc.rules[1].selection.count_number, 180);
}

#[test]
fn test_plan_serializes_mutability() {
    let plan = plan_repository("web", &RepositoryArgs::new().without_lifecycle_policy()).unwrap();
    let value = serde_json::to_value(&plan).unwrap();

    assert_eq!(value["imageTagMutability"], "MUTABLE");
    assert_eq!(value["lifecyclePolicy"], serde_json::Value::Null);
}
