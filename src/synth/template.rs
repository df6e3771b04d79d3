//! # Template Rendering
//!
//! Turns a [`ResourceGraph`] into a CloudFormation template. Resources keep
//! their declaration order in the rendered document.

use crate::constants::{BOOTSTRAP_QUALIFIER, MIN_BOOTSTRAP_VERSION};
use crate::error::{Result, StackError};
use crate::graph::{Expr, Resource, ResourceGraph};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Name of the parameter holding the deployed bootstrap version
pub const BOOTSTRAP_VERSION_PARAMETER: &str = "BootstrapVersion";

/// Rendering of the template document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(StackError::invalid_property(
                "synth",
                "format",
                format!("unknown output format {other:?}, expected json or yaml"),
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "is_empty_object")]
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Expr,
}

/// A complete template document
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Resources", serialize_with = "ordered")]
    pub resources: Vec<(String, TemplateResource)>,
    #[serde(rename = "Outputs", skip_serializing_if = "Vec::is_empty", serialize_with = "ordered")]
    pub outputs: Vec<(String, TemplateOutput)>,
    #[serde(rename = "Parameters")]
    pub parameters: Value,
    #[serde(rename = "Rules")]
    pub rules: Value,
}

impl Template {
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&TemplateResource> {
        self.resources
            .iter()
            .find(|(id, _)| id == logical_id)
            .map(|(_, resource)| resource)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Yaml => self.to_yaml(),
        }
    }
}

impl ResourceGraph {
    /// Render the graph as a template
    #[must_use]
    pub fn to_template(&self) -> Template {
        let resources = self
            .resources()
            .iter()
            .map(|resource| {
                (
                    resource.logical_id().to_string(),
                    template_resource(self.stack_name(), resource),
                )
            })
            .collect();

        let outputs = self
            .outputs()
            .iter()
            .map(|output| {
                (
                    output.name.clone(),
                    TemplateOutput {
                        description: output.description.clone(),
                        value: output.value.clone(),
                    },
                )
            })
            .collect();

        Template {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: self.props().description.clone(),
            resources,
            outputs,
            parameters: bootstrap_parameters(),
            rules: bootstrap_rules(),
        }
    }
}

fn template_resource(stack_name: &str, resource: &Resource) -> TemplateResource {
    let policy = resource.removal_policy().map(|p| p.as_str().to_string());
    let mut metadata = resource.metadata().clone();
    metadata.insert(
        "aws:cdk:path".to_string(),
        Value::String(format!("{stack_name}/{}", resource.path())),
    );

    TemplateResource {
        resource_type: resource.resource_type().to_string(),
        properties: resource.properties().clone(),
        depends_on: resource.depends_on().iter().map(ToString::to_string).collect(),
        update_replace_policy: policy.clone(),
        deletion_policy: policy,
        metadata,
    }
}

fn bootstrap_parameters() -> Value {
    json!({
        BOOTSTRAP_VERSION_PARAMETER: {
            "Type": "AWS::SSM::Parameter::Value<String>",
            "Default": format!("/cdk-bootstrap/{BOOTSTRAP_QUALIFIER}/version"),
            "Description": "Version of the bootstrap resources in this environment, automatically retrieved from SSM Parameter Store. [cdk:skip]"
        }
    })
}

// Fails the deployment when the environment was bootstrapped with a version
// too old to host file assets
fn bootstrap_rules() -> Value {
    let unsupported: Vec<String> = (1..MIN_BOOTSTRAP_VERSION).map(|v| v.to_string()).collect();
    json!({
        "CheckBootstrapVersion": {
            "Assertions": [{
                "Assert": {
                    "Fn::Not": [{
                        "Fn::Contains": [unsupported, { "Ref": BOOTSTRAP_VERSION_PARAMETER }]
                    }]
                },
                "AssertDescription": format!(
                    "Bootstrap stack version {MIN_BOOTSTRAP_VERSION} required. Please run 'cdk bootstrap' with a recent version of the CDK CLI."
                )
            }]
        }
    })
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(serde_json::Map::is_empty)
}

fn ordered<S, V>(entries: &[(String, V)], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{RemovalPolicy, ResourceOptions, StackBuilder};
    use crate::resources::iam::{CfnRole, PolicyDocument, Statement};
    use crate::stack::StackProps;

    fn graph() -> ResourceGraph {
        let mut b = StackBuilder::new(
            "TestStack",
            StackProps {
                description: Some("test".to_string()),
                ..StackProps::default()
            },
        )
        .unwrap();
        let role = b
            .add_with(
                "Role/Resource",
                CfnRole {
                    assume_role_policy_document: PolicyDocument::new(vec![Statement::assume_role(
                        "lambda.amazonaws.com",
                    )]),
                    managed_policy_arns: Vec::new(),
                    tags: Vec::new(),
                },
                ResourceOptions::default().removal_policy(RemovalPolicy::Destroy),
            )
            .unwrap();
        b.add_output("RoleArn", role.attr("Arn"), Some("role")).unwrap();
        b.build()
    }

    #[test]
    fn test_template_sections() {
        let graph = graph();
        let template: Value =
            serde_json::from_str(&graph.to_template().to_json().unwrap()).unwrap();
        let id = graph.resources()[0].logical_id().to_string();

        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(template["Description"], "test");
        assert_eq!(template["Resources"][&id]["Type"], "AWS::IAM::Role");
        assert_eq!(template["Resources"][&id]["DeletionPolicy"], "Delete");
        assert_eq!(template["Resources"][&id]["UpdateReplacePolicy"], "Delete");
        assert_eq!(
            template["Resources"][&id]["Metadata"]["aws:cdk:path"],
            "TestStack/Role/Resource"
        );
        assert_eq!(
            template["Outputs"]["RoleArn"]["Value"],
            json!({ "Fn::GetAtt": [id, "Arn"] })
        );
        assert_eq!(
            template["Parameters"]["BootstrapVersion"]["Default"],
            "/cdk-bootstrap/hnb659fds/version"
        );
        assert_eq!(
            template["Rules"]["CheckBootstrapVersion"]["Assertions"][0]["Assert"]["Fn::Not"][0]
                ["Fn::Contains"][0],
            json!(["1", "2", "3", "4", "5"])
        );
    }

    #[test]
    fn test_yaml_parses_back_to_same_document() {
        let template = graph().to_template();
        let from_json: Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();
        let from_yaml: Value = serde_yaml::from_str(&template.to_yaml().unwrap()).unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn test_resources_keep_declaration_order() {
        let mut b = StackBuilder::new("TestStack", StackProps::default()).unwrap();
        for name in ["Zeta", "Alpha", "Mid"] {
            b.add(
                &format!("{name}/Resource"),
                CfnRole {
                    assume_role_policy_document: PolicyDocument::new(vec![]),
                    managed_policy_arns: Vec::new(),
                    tags: Vec::new(),
                },
            )
            .unwrap();
        }
        let json = b.build().to_template().to_json().unwrap();
        let zeta = json.find("\"Zeta").unwrap();
        let alpha = json.find("\"Alpha").unwrap();
        let mid = json.find("\"Mid").unwrap();
        assert!(zeta < alpha && alpha < mid);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("toml".parse::<OutputFormat>().is_err());
    }
}
