//! # Cloud Assembly
//!
//! Writes the template and the asset manifest the provisioning tooling
//! consumes: `<Stack>.template.json|yaml` and `<Stack>.assets.json`.

use crate::constants::BOOTSTRAP_QUALIFIER;
use crate::error::{Result, StackError};
use crate::graph::ResourceGraph;
use crate::synth::template::OutputFormat;
use cfn_arns::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Manifest schema version understood by the asset publisher
pub const ASSET_MANIFEST_VERSION: &str = "36.0.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetManifest {
    pub version: String,
    pub files: BTreeMap<String, FileAssetEntry>,
    pub docker_images: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAssetEntry {
    pub source: AssetSource,
    pub destinations: BTreeMap<String, AssetDestination>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSource {
    pub path: String,
    pub packaging: String,
    pub bundling: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDestination {
    pub bucket_name: String,
    pub object_key: String,
    pub assume_role_arn: String,
}

impl AssetManifest {
    /// Manifest for every asset in `graph`, targeting its environment
    pub fn from_graph(graph: &ResourceGraph) -> Result<Self> {
        let props = graph.props();
        let account = props.account().unwrap_or("${AWS::AccountId}");
        let region = props.region().unwrap_or("${AWS::Region}");
        let destination_id = match (props.account(), props.region()) {
            (Some(account), Some(region)) => format!("{account}-{region}"),
            _ => "current_account-current_region".to_string(),
        };

        let mut role = ArnBuilder::new()
            .service(Service::Iam)
            .resource_type("role")
            .resource(format!(
                "cdk-{BOOTSTRAP_QUALIFIER}-file-publishing-role-{account}-{region}"
            ));
        if let Some(account) = props.account() {
            role = role.account(account);
        }
        let assume_role_arn = role.build_sub()?;

        let files = graph
            .assets()
            .iter()
            .map(|asset| {
                let destination = AssetDestination {
                    bucket_name: format!("cdk-{BOOTSTRAP_QUALIFIER}-assets-{account}-{region}"),
                    object_key: asset.object_key(),
                    assume_role_arn: assume_role_arn.clone(),
                };
                (
                    asset.hash.clone(),
                    FileAssetEntry {
                        source: AssetSource {
                            path: asset.source_path.clone(),
                            packaging: asset.packaging.clone(),
                            bundling: asset.bundling.clone(),
                        },
                        destinations: BTreeMap::from([(destination_id.clone(), destination)]),
                    },
                )
            })
            .collect();

        Ok(Self {
            version: ASSET_MANIFEST_VERSION.to_string(),
            files,
            docker_images: BTreeMap::new(),
        })
    }
}

/// Write the assembly for `graph` into `dir`, returning the written files
pub fn write_assembly(
    graph: &ResourceGraph,
    dir: &Path,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| StackError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let template_path = dir.join(format!("{}.template.{}", graph.stack_name(), format.extension()));
    write_file(&template_path, &graph.to_template().render(format)?)?;

    let manifest_path = dir.join(format!("{}.assets.json", graph.stack_name()));
    let manifest = AssetManifest::from_graph(graph)?;
    write_file(&manifest_path, &serde_json::to_string_pretty(&manifest)?)?;

    info!(
        stack = %graph.stack_name(),
        dir = %dir.display(),
        resources = graph.resources().len(),
        assets = manifest.files.len(),
        "Wrote cloud assembly"
    );
    Ok(vec![template_path, manifest_path])
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    debug!(path = %path.display(), bytes = contents.len(), "Writing file");
    std::fs::write(path, contents).map_err(|source| StackError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FileAsset, StackBuilder};
    use crate::stack::{Environment, StackProps};
    use serde_json::json;
    use tempfile::TempDir;

    fn graph_with_asset(props: StackProps) -> ResourceGraph {
        let mut b = StackBuilder::new("TestStack", props).unwrap();
        b.add_asset(FileAsset {
            hash: "abc123".to_string(),
            source_path: "lambda".to_string(),
            packaging: "zip".to_string(),
            bundling: json!({"forceDockerBundling": true}),
        });
        b.build()
    }

    #[test]
    fn test_manifest_for_agnostic_environment() {
        let manifest = AssetManifest::from_graph(&graph_with_asset(StackProps::default())).unwrap();
        let entry = &manifest.files["abc123"];
        let destination = &entry.destinations["current_account-current_region"];
        assert_eq!(
            destination.bucket_name,
            "cdk-hnb659fds-assets-${AWS::AccountId}-${AWS::Region}"
        );
        assert_eq!(destination.object_key, "abc123.zip");
        assert_eq!(
            destination.assume_role_arn,
            "arn:${AWS::Partition}:iam::${AWS::AccountId}:role/cdk-hnb659fds-file-publishing-role-${AWS::AccountId}-${AWS::Region}"
        );
        assert_eq!(entry.source.path, "lambda");
    }

    #[test]
    fn test_manifest_for_pinned_environment() {
        let props = StackProps {
            env: Some(Environment {
                account: Some("123456789012".to_string()),
                region: Some("eu-west-1".to_string()),
            }),
            ..StackProps::default()
        };
        let manifest = AssetManifest::from_graph(&graph_with_asset(props)).unwrap();
        let destination = &manifest.files["abc123"].destinations["123456789012-eu-west-1"];
        assert_eq!(destination.bucket_name, "cdk-hnb659fds-assets-123456789012-eu-west-1");
    }

    #[test]
    fn test_write_assembly() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("cdk.out");
        let graph = graph_with_asset(StackProps::default());

        let written = write_assembly(&graph, &out, OutputFormat::Yaml).unwrap();
        assert_eq!(written.len(), 2);
        assert!(out.join("TestStack.template.yaml").is_file());

        let contents = std::fs::read_to_string(out.join("TestStack.assets.json")).unwrap();
        let manifest: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(manifest["version"], ASSET_MANIFEST_VERSION);
        assert!(manifest["files"]["abc123"].is_object());
    }
}
