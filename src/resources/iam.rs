//! # IAM Resources
//!
//! Roles, inline policies and the policy document model shared by both.

use super::Tag;
use crate::graph::Expr;
use serde::{Serialize, Serializer};

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Service principal, e.g. `lambda.amazonaws.com`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(serialize_with = "one_or_many")]
    pub action: Vec<String>,
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Expr>,
}

impl Statement {
    /// Allow `actions` on `resource`
    pub fn allow(actions: &[&str], resource: Expr) -> Self {
        Self {
            action: actions.iter().map(|a| (*a).to_string()).collect(),
            effect: Effect::Allow,
            principal: None,
            resource: Some(resource),
        }
    }

    /// Trust statement letting `service` assume the role
    pub fn assume_role(service: &str) -> Self {
        Self {
            action: vec!["sts:AssumeRole".to_string()],
            effect: Effect::Allow,
            principal: Some(Principal {
                service: service.to_string(),
            }),
            resource: None,
        }
    }
}

// A single action is written as a plain string
fn one_or_many<S: Serializer>(actions: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    match actions {
        [single] => serializer.serialize_str(single),
        many => many.serialize(serializer),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub statement: Vec<Statement>,
    pub version: String,
}

impl PolicyDocument {
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            statement,
            version: POLICY_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRole {
    pub assume_role_policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<Expr>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnRole, "AWS::IAM::Role", tagged);

/// Inline policy attached to one or more roles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnPolicy {
    pub policy_document: PolicyDocument,
    pub policy_name: String,
    pub roles: Vec<Expr>,
}
cfn_resource!(CfnPolicy, "AWS::IAM::Policy");
