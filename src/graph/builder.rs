//! # Stack Builder
//!
//! Registers resource descriptors in declaration order and rejects any
//! declaration that points at something not registered yet.

use crate::error::{Result, StackError};
use crate::graph::expr::sub_references;
use crate::graph::{Expr, FileAsset, LogicalId, Output, RemovalPolicy, Resource, ResourceGraph};
use crate::resources::{CfnResource, Tag};
use crate::stack::StackProps;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace};

/// Handle to a registered resource
///
/// Hands out deferred values; nothing here is known before apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    logical_id: LogicalId,
    resource_type: &'static str,
}

impl ResourceRef {
    #[must_use]
    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    #[must_use]
    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// `{"Ref": <id>}`
    #[must_use]
    pub fn reference(&self) -> Expr {
        Expr::Ref(self.logical_id.clone())
    }

    /// `{"Fn::GetAtt": [<id>, <attribute>]}`
    #[must_use]
    pub fn attr(&self, attribute: &str) -> Expr {
        Expr::GetAtt {
            target: self.logical_id.clone(),
            attribute: attribute.to_string(),
        }
    }
}

/// Template-level options that sit beside the property set
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    pub depends_on: Vec<LogicalId>,
    pub removal_policy: Option<RemovalPolicy>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ResourceOptions {
    #[must_use]
    pub fn depends_on(mut self, resource: &ResourceRef) -> Self {
        if !self.depends_on.contains(&resource.logical_id) {
            self.depends_on.push(resource.logical_id.clone());
        }
        self
    }

    #[must_use]
    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = Some(policy);
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Collects declarations for one stack
#[derive(Debug)]
pub struct StackBuilder {
    stack_name: String,
    props: StackProps,
    resources: Vec<Resource>,
    index: HashMap<LogicalId, usize>,
    outputs: Vec<Output>,
    assets: Vec<FileAsset>,
}

impl StackBuilder {
    /// Start a stack; fails fast on a malformed name or property
    pub fn new(stack_name: &str, props: StackProps) -> Result<Self> {
        crate::stack::validate_stack_name(stack_name)?;
        props.validate()?;

        Ok(Self {
            stack_name: stack_name.to_string(),
            props,
            resources: Vec::new(),
            index: HashMap::new(),
            outputs: Vec::new(),
            assets: Vec::new(),
        })
    }

    #[must_use]
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    #[must_use]
    pub fn props(&self) -> &StackProps {
        &self.props
    }

    /// Logical ID a resource at `path` would receive
    #[must_use]
    pub fn logical_id(&self, path: &str) -> LogicalId {
        LogicalId::from_path(&self.stack_name, path)
    }

    #[must_use]
    pub fn contains(&self, logical_id: &LogicalId) -> bool {
        self.index.contains_key(logical_id)
    }

    /// Handle to the resource already registered at `path`
    #[must_use]
    pub fn resource_at(&self, path: &str) -> Option<ResourceRef> {
        let logical_id = self.logical_id(path);
        let resource_type = self
            .index
            .get(&logical_id)
            .and_then(|&i| self.resources.get(i))?
            .resource_type;
        Some(ResourceRef {
            logical_id,
            resource_type,
        })
    }

    /// Register a resource with default options
    pub fn add<R: CfnResource>(&mut self, path: &str, properties: R) -> Result<ResourceRef> {
        self.add_with(path, properties, ResourceOptions::default())
    }

    /// Register a resource
    ///
    /// Stack tags are merged into taggable resources; a tag set on the
    /// resource itself wins over a stack tag with the same key.
    pub fn add_with<R: CfnResource>(
        &mut self,
        path: &str,
        mut properties: R,
        options: ResourceOptions,
    ) -> Result<ResourceRef> {
        let logical_id = self.logical_id(path);
        if self.index.contains_key(&logical_id) {
            return Err(StackError::DuplicateLogicalId(logical_id.to_string()));
        }

        if let Some(tags) = properties.tags_mut() {
            merge_tags(tags, &self.props.tags);
        }

        let properties = serde_json::to_value(&properties)?;
        let references: BTreeSet<LogicalId> = json_references(&properties)
            .into_iter()
            .map(LogicalId::from_raw)
            .collect();

        for target in references.iter().chain(options.depends_on.iter()) {
            if !self.index.contains_key(target) {
                return Err(StackError::UnresolvedReference {
                    from: format!("{}/{path}", self.stack_name),
                    target: target.to_string(),
                });
            }
        }

        debug!(
            logical_id = %logical_id,
            resource_type = R::TYPE,
            path,
            references = references.len(),
            "Registered resource"
        );

        self.index.insert(logical_id.clone(), self.resources.len());
        self.resources.push(Resource {
            logical_id: logical_id.clone(),
            path: path.to_string(),
            resource_type: R::TYPE,
            properties,
            references,
            depends_on: options.depends_on,
            removal_policy: options.removal_policy,
            metadata: options.metadata,
        });

        Ok(ResourceRef {
            logical_id,
            resource_type: R::TYPE,
        })
    }

    /// Export a value under `name`
    pub fn add_output(&mut self, name: &str, value: Expr, description: Option<&str>) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StackError::invalid_property(
                "Outputs",
                name,
                "output names must be non-empty and alphanumeric",
            ));
        }
        if self.outputs.iter().any(|o| o.name == name) {
            return Err(StackError::DuplicateOutput(name.to_string()));
        }
        for target in value.references() {
            if !self.index.contains_key(&LogicalId::from_raw(target.clone())) {
                return Err(StackError::UnresolvedReference {
                    from: format!("{}/Outputs/{name}", self.stack_name),
                    target,
                });
            }
        }

        debug!(output = name, "Registered output");
        self.outputs.push(Output {
            name: name.to_string(),
            value,
            description: description.map(str::to_string),
        });
        Ok(())
    }

    /// Record a file asset; identical content is recorded once
    pub fn add_asset(&mut self, asset: FileAsset) {
        if self.assets.iter().any(|a| a.hash == asset.hash) {
            trace!(hash = %asset.hash, "Asset already recorded");
            return;
        }
        self.assets.push(asset);
    }

    /// Freeze the graph
    #[must_use]
    pub fn build(self) -> ResourceGraph {
        debug!(
            stack = %self.stack_name,
            resources = self.resources.len(),
            outputs = self.outputs.len(),
            "Resource graph complete"
        );
        ResourceGraph {
            stack_name: self.stack_name,
            props: self.props,
            resources: self.resources,
            outputs: self.outputs,
            assets: self.assets,
        }
    }
}

fn merge_tags(tags: &mut Vec<Tag>, stack_tags: &BTreeMap<String, String>) {
    for (key, value) in stack_tags {
        if !tags.iter().any(|t| &t.key == key) {
            tags.push(Tag::new(key.clone(), value.clone()));
        }
    }
    tags.sort_by(|a, b| a.key.cmp(&b.key));
}

/// Logical IDs referenced anywhere in a serialized property set
fn json_references(value: &serde_json::Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    collect_json_references(value, &mut found);
    found
}

fn collect_json_references(value: &serde_json::Value, found: &mut BTreeSet<String>) {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(target)) = map.get("Ref") {
                    if !target.contains("::") {
                        found.insert(target.clone());
                    }
                    return;
                }
                if let Some(args) = map.get("Fn::GetAtt") {
                    match args {
                        Value::Array(items) => {
                            if let Some(Value::String(target)) = items.first() {
                                found.insert(target.clone());
                            }
                        }
                        Value::String(dotted) => {
                            if let Some((target, _)) = dotted.split_once('.') {
                                found.insert(target.to_string());
                            }
                        }
                        _ => {}
                    }
                    return;
                }
                if let Some(args) = map.get("Fn::Sub") {
                    match args {
                        Value::String(template) => found.extend(sub_references(template)),
                        Value::Array(items) => {
                            // Variables defined in the map shadow resource names
                            let local: BTreeSet<&str> = items
                                .get(1)
                                .and_then(Value::as_object)
                                .map(|vars| vars.keys().map(String::as_str).collect())
                                .unwrap_or_default();
                            if let Some(Value::String(template)) = items.first() {
                                found.extend(
                                    sub_references(template)
                                        .filter(|n| !local.contains(n.as_str())),
                                );
                            }
                            for item in items.iter().skip(1) {
                                collect_json_references(item, found);
                            }
                        }
                        _ => {}
                    }
                    return;
                }
            }
            for item in map.values() {
                collect_json_references(item, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json_references(item, found);
            }
        }
        _ => {}
    }
}
