//! # Logical IDs
//!
//! Template keys derived from a resource's construct path.
//!
//! The human-readable part is the path with non-alphanumeric characters
//! removed, `Default` components dropped everywhere and `Resource`
//! components dropped from the readable part only. The suffix is the first
//! eight hex digits of the MD5 of the stack name and the path, so the same
//! declaration always lands on the same key and two stacks never share one.

use serde::{Serialize, Serializer};
use std::fmt;

/// Components that never contribute to an ID
const HIDDEN_ID: &str = "Default";

/// Components that contribute to the hash but not the readable part
const HIDDEN_FROM_HUMAN_ID: &str = "Resource";

/// CloudFormation limit on logical ID length
const MAX_LOGICAL_ID_LEN: usize = 255;

const HASH_LEN: usize = 8;

/// Key of a resource in the synthesized template
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalId(String);

impl LogicalId {
    /// Derive the ID for `path` inside the stack `stack_name`
    ///
    /// `path` uses `/` between components, e.g. `VPC/PublicSubnet1/Subnet`.
    #[must_use]
    pub fn from_path(stack_name: &str, path: &str) -> Self {
        let components: Vec<&str> = path
            .split('/')
            .filter(|c| !c.is_empty() && *c != HIDDEN_ID)
            .collect();

        let hash_input = std::iter::once(stack_name)
            .chain(components.iter().copied())
            .collect::<Vec<_>>()
            .join("/");
        let digest = format!("{:x}", md5::compute(hash_input.as_bytes()));
        let hash = digest[..HASH_LEN].to_uppercase();

        let mut human = String::new();
        let mut previous: Option<&str> = None;
        for component in components.iter().filter(|c| **c != HIDDEN_FROM_HUMAN_ID) {
            // VPC/VPC/... reads as VPC
            if previous == Some(*component) {
                continue;
            }
            human.extend(component.chars().filter(char::is_ascii_alphanumeric));
            previous = Some(component);
        }
        human.truncate(MAX_LOGICAL_ID_LEN - HASH_LEN);

        LogicalId(format!("{human}{hash}"))
    }

    /// Wrap an ID that is already in template form
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        LogicalId(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for LogicalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_component_hidden_from_readable_part() {
        let id = LogicalId::from_path("LambdaRDSStack", "VPC/Resource");
        assert!(id.as_str().starts_with("VPC"));
        assert_eq!(id.as_str().len(), "VPC".len() + HASH_LEN);
        assert!(id.as_str()[3..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_resource_component_still_changes_hash() {
        let with = LogicalId::from_path("S", "VPC/Resource");
        let without = LogicalId::from_path("S", "VPC");
        assert_ne!(with, without);
    }

    #[test]
    fn test_default_component_ignored_entirely() {
        assert_eq!(
            LogicalId::from_path("S", "lambda/ServiceRole/Default/Resource"),
            LogicalId::from_path("S", "lambda/ServiceRole/Resource")
        );
    }

    #[test]
    fn test_non_alphanumerics_stripped() {
        let id = LogicalId::from_path("S", "My-Db/Secret_Attachment");
        assert!(id.as_str().starts_with("MyDbSecretAttachment"));
    }

    #[test]
    fn test_stack_name_changes_id() {
        let a = LogicalId::from_path("StackA", "MySql/Resource");
        let b = LogicalId::from_path("StackB", "MySql/Resource");
        assert_ne!(a, b);
        assert_eq!(a, LogicalId::from_path("StackA", "MySql/Resource"));
    }

    #[test]
    fn test_consecutive_duplicates_collapsed() {
        let id = LogicalId::from_path("S", "VPC/VPC/Subnet");
        assert!(id.as_str().starts_with("VPCSubnet"));
    }

    #[test]
    fn test_length_capped() {
        let long = "A".repeat(400);
        let id = LogicalId::from_path("S", &long);
        assert_eq!(id.as_str().len(), MAX_LOGICAL_ID_LEN);
    }
}
