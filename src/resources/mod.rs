//! # Resource Properties
//!
//! Typed property sets for the CloudFormation resource types this stack
//! declares. Field names serialize to the provider's property names; values
//! that point at other resources are [`Expr`](crate::graph::Expr)s.
//!
//! ## Module Structure
//!
//! - `ec2.rs` - VPC, subnets, routing, gateways, security groups
//! - `rds.rs` - DB subnet group and DB instance
//! - `secretsmanager.rs` - generated admin credentials
//! - `iam.rs` - roles, inline policies, policy documents
//! - `lambda.rs` - function

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A property set that maps to one CloudFormation resource type
pub trait CfnResource: Serialize + Debug {
    /// Provider type name, e.g. `AWS::EC2::VPC`
    const TYPE: &'static str;

    /// Tag list, for types that accept tags
    fn tags_mut(&mut self) -> Option<&mut Vec<Tag>> {
        None
    }
}

/// Resource tag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Implements [`CfnResource`] for a property struct.
///
/// The `tagged` form expects a `tags: Vec<Tag>` field.
macro_rules! cfn_resource {
    ($ty:ty, $name:literal) => {
        impl $crate::resources::CfnResource for $ty {
            const TYPE: &'static str = $name;
        }
    };
    ($ty:ty, $name:literal, tagged) => {
        impl $crate::resources::CfnResource for $ty {
            const TYPE: &'static str = $name;

            fn tags_mut(&mut self) -> Option<&mut Vec<$crate::resources::Tag>> {
                Some(&mut self.tags)
            }
        }
    };
}

pub mod ec2;
pub mod iam;
pub mod lambda;
pub mod rds;
pub mod secretsmanager;
