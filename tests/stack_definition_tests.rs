//! # Stack Definition Tests
//!
//! Properties of the declared Lambda + RDS stack:
//! - database placement and teardown behaviour
//! - function environment wiring
//! - connect grant and network rules
//! - outputs and logical ID stability

use lambda_rds_stack::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn graph() -> ResourceGraph {
    define("LambdaRDSStack", StackProps::default()).expect("stack should define")
}

fn id_of(graph: &ResourceGraph, path: &str) -> String {
    graph
        .resource_at(path)
        .unwrap_or_else(|| panic!("no resource at {path}"))
        .logical_id()
        .to_string()
}

fn refs(ids: &[String]) -> Value {
    Value::Array(ids.iter().map(|id| json!({ "Ref": id })).collect())
}

#[test]
fn test_database_only_in_private_subnets() {
    let graph = graph();
    let group = graph.resource_at("MySql/SubnetGroup/Default").unwrap();

    let private = vec![
        id_of(&graph, "VPC/PrivateSubnet1/Subnet"),
        id_of(&graph, "VPC/PrivateSubnet2/Subnet"),
    ];
    assert_eq!(group.property("SubnetIds").unwrap(), &refs(&private));

    let public: BTreeSet<String> = ["VPC/PublicSubnet1/Subnet", "VPC/PublicSubnet2/Subnet"]
        .iter()
        .map(|p| id_of(&graph, p))
        .collect();
    let subnet_ids = group.property("SubnetIds").unwrap().to_string();
    for id in public {
        assert!(!subnet_ids.contains(&id), "public subnet {id} must not host the database");
    }

    let instance = graph.resource_at("MySql/Resource").unwrap();
    assert_eq!(instance.property("PubliclyAccessible").unwrap(), false);
}

#[test]
fn test_database_properties() {
    let graph = graph();
    let instance = graph.resource_at("MySql/Resource").unwrap();

    assert_eq!(instance.resource_type(), "AWS::RDS::DBInstance");
    assert_eq!(instance.property("Engine").unwrap(), "mysql");
    assert_eq!(instance.property("DBName").unwrap(), "foo");
    assert_eq!(instance.property("EnableIAMDatabaseAuthentication").unwrap(), true);
    assert_eq!(instance.property("DeleteAutomatedBackups").unwrap(), true);
    assert_eq!(instance.removal_policy(), Some(RemovalPolicy::Destroy));

    let template = graph.to_template();
    let rendered = template.resource(instance.logical_id().as_str()).unwrap();
    assert_eq!(rendered.deletion_policy.as_deref(), Some("Delete"));
    assert_eq!(rendered.update_replace_policy.as_deref(), Some("Delete"));
}

#[test]
fn test_function_environment() {
    let graph = graph();
    let db = id_of(&graph, "MySql/Resource");
    let function = graph.resource_at("lambda/Resource").unwrap();
    let variables = function.property("Environment").unwrap()["Variables"]
        .as_object()
        .unwrap();

    let keys: Vec<&str> = variables.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["DB_HOSTNAME", "DB_NAME", "DB_PORT", "DB_USERNAME"]);
    assert_eq!(variables["DB_HOSTNAME"], json!({ "Fn::GetAtt": [db, "Endpoint.Address"] }));
    assert_eq!(variables["DB_PORT"], json!({ "Fn::GetAtt": [db, "Endpoint.Port"] }));
    assert_eq!(variables["DB_NAME"], "foo");
    assert_eq!(variables["DB_USERNAME"], "lambda");
}

#[test]
fn test_function_runtime_and_placement() {
    let graph = graph();
    let function = graph.resource_at("lambda/Resource").unwrap();

    assert_eq!(function.property("Runtime").unwrap(), "provided.al2023");
    assert_eq!(function.property("Handler").unwrap(), "bootstrap");
    assert_eq!(function.property("Timeout").unwrap(), 60);

    let vpc_config = function.property("VpcConfig").unwrap();
    let lambda_sg = id_of(&graph, "LambdaSG/Resource");
    assert_eq!(
        vpc_config["SecurityGroupIds"],
        json!([{ "Fn::GetAtt": [lambda_sg, "GroupId"] }])
    );
    let private = vec![
        id_of(&graph, "VPC/PrivateSubnet1/Subnet"),
        id_of(&graph, "VPC/PrivateSubnet2/Subnet"),
    ];
    assert_eq!(vpc_config["SubnetIds"], refs(&private));

    let bucket = &function.property("Code").unwrap()["S3Bucket"];
    assert_eq!(
        bucket,
        &json!({ "Fn::Sub": "cdk-hnb659fds-assets-${AWS::AccountId}-${AWS::Region}" })
    );
    assert_eq!(graph.assets().len(), 1);
    assert_eq!(graph.assets()[0].bundling["forceDockerBundling"], true);
}

#[test]
fn test_lambda_security_group() {
    let graph = graph();
    let group = graph.resource_at("LambdaSG/Resource").unwrap();
    assert_eq!(group.property("GroupName").unwrap(), "LambdaSG");
    assert_eq!(
        group.property("SecurityGroupEgress").unwrap()[0]["IpProtocol"],
        "-1"
    );
}

#[test]
fn test_connect_grant_names_lambda_user() {
    let graph = graph();
    let policies = graph.resources_of_type("AWS::IAM::Policy");
    assert_eq!(policies.len(), 1);

    let statement = &policies[0].properties()["PolicyDocument"]["Statement"][0];
    assert_eq!(statement["Action"], "rds-db:connect");
    let resource = statement["Resource"].to_string();
    assert!(resource.contains("/lambda"));
    assert!(!resource.contains("admin"));
    assert!(resource.contains("DbiResourceId"));

    let role = id_of(&graph, "lambda/ServiceRole/Resource");
    assert_eq!(policies[0].property("Roles").unwrap(), &refs(&[role]));
}

#[test]
fn test_network_rules_on_database_group() {
    let graph = graph();
    let db_sg = id_of(&graph, "MySql/SecurityGroup/Resource");
    let lambda_sg = id_of(&graph, "LambdaSG/Resource");
    let db = id_of(&graph, "MySql/Resource");

    let ingress = graph.resources_of_type("AWS::EC2::SecurityGroupIngress");
    assert_eq!(ingress.len(), 2);

    let broad = ingress
        .iter()
        .find(|r| r.property("CidrIp").is_some())
        .unwrap();
    assert_eq!(broad.property("CidrIp").unwrap(), "0.0.0.0/0");
    assert_eq!(broad.property("FromPort").unwrap(), 0);
    assert_eq!(broad.property("ToPort").unwrap(), 65535);

    let narrow = ingress
        .iter()
        .find(|r| r.property("SourceSecurityGroupId").is_some())
        .unwrap();
    assert_eq!(
        narrow.property("SourceSecurityGroupId").unwrap(),
        &json!({ "Fn::GetAtt": [lambda_sg, "GroupId"] })
    );
    assert_eq!(
        narrow.property("FromPort").unwrap(),
        &json!({ "Fn::GetAtt": [db, "Endpoint.Port"] })
    );
    for rule in ingress {
        assert_eq!(
            rule.property("GroupId").unwrap(),
            &json!({ "Fn::GetAtt": [db_sg, "GroupId"] })
        );
    }

    assert!(graph.resources_of_type("AWS::EC2::SecurityGroupEgress").is_empty());
}

#[test]
fn test_single_output_is_function_arn() {
    let graph = graph();
    let function = id_of(&graph, "lambda/Resource");
    assert_eq!(graph.outputs().len(), 1);

    let output = graph.output("LambdaFunctionARN").unwrap();
    assert_eq!(
        serde_json::to_value(&output.value).unwrap(),
        json!({ "Fn::GetAtt": [function, "Arn"] })
    );
}

#[test]
fn test_declaration_order_is_creation_order() {
    let graph = graph();
    let mut seen = BTreeSet::new();
    for resource in graph.resources() {
        for dependency in resource.references().iter().chain(resource.depends_on()) {
            assert!(
                seen.contains(dependency),
                "{} depends on {dependency}, declared later",
                resource.logical_id()
            );
        }
        seen.insert(resource.logical_id().clone());
    }
}

#[test]
fn test_resynthesis_is_identical() {
    let first = graph().to_template().to_json().unwrap();
    let second = graph().to_template().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_stack_name_changes_every_logical_id() {
    let a = define("StackA", StackProps::default()).unwrap();
    let b = define("StackB", StackProps::default()).unwrap();

    let ids = |graph: &ResourceGraph| -> BTreeSet<String> {
        graph
            .resources()
            .iter()
            .map(|r| r.logical_id().to_string())
            .collect()
    };
    let a_ids = ids(&a);
    let b_ids = ids(&b);
    assert_eq!(a_ids.len(), b_ids.len());
    assert!(a_ids.is_disjoint(&b_ids));
}

#[test]
fn test_stack_tags_reach_taggable_resources() {
    let mut props = StackProps::default();
    props.tags.insert("team".to_string(), "platform".to_string());
    let graph = define("LambdaRDSStack", props).unwrap();

    let instance = graph.resource_at("MySql/Resource").unwrap();
    assert_eq!(
        instance.property("Tags").unwrap(),
        &json!([{ "Key": "team", "Value": "platform" }])
    );
    let policy = graph.resources_of_type("AWS::IAM::Policy")[0];
    assert!(policy.property("Tags").is_none());
}
