//! # Graph Model
//!
//! Immutable artifacts handed to synthesis.

use crate::graph::{Expr, LogicalId};
use crate::stack::StackProps;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// What happens to a resource when it leaves the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    /// Delete the physical resource
    #[serde(rename = "Delete")]
    Destroy,
    /// Keep the physical resource, orphaned from the stack
    Retain,
    /// Take a final snapshot, then delete
    Snapshot,
}

impl RemovalPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
            RemovalPolicy::Snapshot => "Snapshot",
        }
    }
}

/// One registered resource descriptor
#[derive(Debug, Clone)]
pub struct Resource {
    pub(crate) logical_id: LogicalId,
    pub(crate) path: String,
    pub(crate) resource_type: &'static str,
    pub(crate) properties: serde_json::Value,
    pub(crate) references: BTreeSet<LogicalId>,
    pub(crate) depends_on: Vec<LogicalId>,
    pub(crate) removal_policy: Option<RemovalPolicy>,
    pub(crate) metadata: BTreeMap<String, serde_json::Value>,
}

impl Resource {
    #[must_use]
    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// Construct path inside the stack, e.g. `VPC/PublicSubnet1/Subnet`
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// Serialized property set
    #[must_use]
    pub fn properties(&self) -> &serde_json::Value {
        &self.properties
    }

    /// Single property by provider name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// Resources named in the property values
    #[must_use]
    pub fn references(&self) -> &BTreeSet<LogicalId> {
        &self.references
    }

    /// Explicit ordering edges
    #[must_use]
    pub fn depends_on(&self) -> &[LogicalId] {
        &self.depends_on
    }

    #[must_use]
    pub fn removal_policy(&self) -> Option<RemovalPolicy> {
        self.removal_policy
    }

    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}

/// Value exported by the stack after apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String,
    pub value: Expr,
    pub description: Option<String>,
}

/// Packaged code uploaded to the bootstrap asset bucket before apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAsset {
    /// Content fingerprint, also the object key stem
    pub hash: String,
    /// Source directory relative to the project root
    pub source_path: String,
    pub packaging: String,
    /// Build options that shaped the artifact
    pub bundling: serde_json::Value,
}

impl FileAsset {
    #[must_use]
    pub fn object_key(&self) -> String {
        format!("{}.zip", self.hash)
    }
}

/// Finished, immutable resource graph
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    pub(crate) stack_name: String,
    pub(crate) props: StackProps,
    pub(crate) resources: Vec<Resource>,
    pub(crate) outputs: Vec<Output>,
    pub(crate) assets: Vec<FileAsset>,
}

impl ResourceGraph {
    #[must_use]
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    #[must_use]
    pub fn props(&self) -> &StackProps {
        &self.props
    }

    /// Resources in declaration order
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.logical_id.as_str() == logical_id)
    }

    /// Resource registered at a construct path
    #[must_use]
    pub fn resource_at(&self, path: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.path == path)
    }

    #[must_use]
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    /// Everything `logical_id` needs to exist first
    #[must_use]
    pub fn dependencies(&self, logical_id: &str) -> BTreeSet<&LogicalId> {
        self.resource(logical_id)
            .map(|r| r.references.iter().chain(r.depends_on.iter()).collect())
            .unwrap_or_default()
    }

    /// Everything that needs `logical_id` to exist first
    #[must_use]
    pub fn dependents(&self, logical_id: &str) -> Vec<&LogicalId> {
        self.resources
            .iter()
            .filter(|r| {
                r.references.iter().any(|id| id.as_str() == logical_id)
                    || r.depends_on.iter().any(|id| id.as_str() == logical_id)
            })
            .map(|r| &r.logical_id)
            .collect()
    }

    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    #[must_use]
    pub fn assets(&self) -> &[FileAsset] {
        &self.assets
    }
}
