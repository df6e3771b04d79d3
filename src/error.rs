//! # Errors
//!
//! Failures detectable while building the resource graph. Everything that can
//! go wrong at apply time belongs to the provisioning engine and is not
//! modelled here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("Invalid stack name {name:?}: {reason}")]
    InvalidStackName { name: String, reason: String },

    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    #[error("Invalid tag {key:?}: {reason}")]
    InvalidTag { key: String, reason: String },

    #[error("Invalid property {property} on {resource}: {reason}")]
    InvalidProperty {
        resource: String,
        property: String,
        reason: String,
    },

    #[error("Logical ID {0} is already declared")]
    DuplicateLogicalId(String),

    #[error("Output {0} is already declared")]
    DuplicateOutput(String),

    #[error("{from} references {target}, which has not been declared yet")]
    UnresolvedReference { from: String, target: String },

    #[error("ARN construction failed: {0}")]
    Arn(#[from] cfn_arns::errors::ArnBuilderError),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StackError {
    pub(crate) fn invalid_property(
        resource: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        StackError::InvalidProperty {
            resource: resource.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StackError {
    fn from(e: serde_json::Error) -> Self {
        StackError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for StackError {
    fn from(e: serde_yaml::Error) -> Self {
        StackError::Serialization(e.to_string())
    }
}

pub type Result<T, E = StackError> = std::result::Result<T, E>;
