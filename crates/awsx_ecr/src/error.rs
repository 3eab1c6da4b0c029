//! Error types for ECR planning.

use thiserror::Error;

/// Result type alias for ECR operations.
pub type EcrResult<T> = Result<T, EcrError>;

/// Errors that can occur while compiling lifecycle policies or planning repositories.
#[derive(Error, Debug)]
pub enum EcrError {
    #[error("At most one [selection: \"any\"] rule can be provided, found {0}")]
    TooManyAnyRules(usize),

    #[error("Either [maximumNumberOfImages] or [maximumAgeLimit] must be provided with a rule: {rule}")]
    MissingExpiryCondition { rule: String },

    #[error("tagPrefixList cannot be empty for tagged rule: {rule}")]
    MissingTagPrefixList { rule: String },

    #[error("Invalid repository name: {0}")]
    InvalidRepositoryName(String),

    #[error("Invalid name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
