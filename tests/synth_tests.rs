//! # Synthesis Tests
//!
//! Cloud assembly output for the full stack.

use lambda_rds_stack::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_write_json_assembly() {
    let graph = define("LambdaRDSStack", StackProps::default()).unwrap();
    let dir = TempDir::new().unwrap();

    let written = write_assembly(&graph, dir.path(), OutputFormat::Json).unwrap();
    assert_eq!(written.len(), 2);

    let template: Value =
        serde_json::from_str(&read(dir.path().join("LambdaRDSStack.template.json"))).unwrap();
    let resources = template["Resources"].as_object().unwrap();
    assert_eq!(resources.len(), graph.resources().len());
    assert!(template["Outputs"]["LambdaFunctionARN"]["Value"]["Fn::GetAtt"].is_array());
    assert!(template["Parameters"]["BootstrapVersion"].is_object());

    let manifest: Value =
        serde_json::from_str(&read(dir.path().join("LambdaRDSStack.assets.json"))).unwrap();
    let hash = &graph.assets()[0].hash;
    assert_eq!(
        manifest["files"][hash]["destinations"]["current_account-current_region"]["objectKey"],
        format!("{hash}.zip")
    );
}

#[test]
fn test_yaml_template_matches_json() {
    let template = define("LambdaRDSStack", StackProps::default())
        .unwrap()
        .to_template();
    let json: Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();
    let yaml: Value = serde_yaml::from_str(&template.to_yaml().unwrap()).unwrap();
    assert_eq!(json, yaml);
}

#[test]
fn test_pinned_environment_assembly() {
    let props = StackProps {
        env: Some(Environment {
            account: Some("123456789012".to_string()),
            region: Some("eu-west-1".to_string()),
        }),
        ..StackProps::default()
    };
    let graph = define("LambdaRDSStack", props).unwrap();
    let dir = TempDir::new().unwrap();
    write_assembly(&graph, dir.path(), OutputFormat::Yaml).unwrap();

    let manifest: Value =
        serde_json::from_str(&read(dir.path().join("LambdaRDSStack.assets.json"))).unwrap();
    let hash = &graph.assets()[0].hash;
    assert_eq!(
        manifest["files"][hash]["destinations"]["123456789012-eu-west-1"]["bucketName"],
        "cdk-hnb659fds-assets-123456789012-eu-west-1"
    );
    assert!(dir.path().join("LambdaRDSStack.template.yaml").is_file());
}
