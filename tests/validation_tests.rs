//! # Validation Tests
//!
//! Definition-time failures:
//! - stack names, environments and tags
//! - duplicate and forward declarations
//! - subnet layout limits

use lambda_rds_stack::constructs::{SubnetConfiguration, VpcProps};
use lambda_rds_stack::prelude::*;
use lambda_rds_stack::resources::iam::{CfnRole, PolicyDocument};

fn role() -> CfnRole {
    CfnRole {
        assume_role_policy_document: PolicyDocument::new(vec![]),
        managed_policy_arns: Vec::new(),
        tags: Vec::new(),
    }
}

#[test]
fn test_invalid_stack_names() {
    for name in ["", "1stack", "my_stack", "stack name"] {
        assert!(
            matches!(
                define(name, StackProps::default()),
                Err(StackError::InvalidStackName { .. })
            ),
            "Stack name '{name}' should be rejected"
        );
    }
}

#[test]
fn test_invalid_environment() {
    let props = StackProps {
        env: Some(Environment {
            account: Some("not-an-account".to_string()),
            region: None,
        }),
        ..StackProps::default()
    };
    assert!(matches!(
        define("LambdaRDSStack", props),
        Err(StackError::InvalidEnvironment(_))
    ));
}

#[test]
fn test_reserved_tag_prefix() {
    let mut props = StackProps::default();
    props.tags.insert("aws:cloudformation:stack-name".to_string(), "x".to_string());
    assert!(matches!(
        define("LambdaRDSStack", props),
        Err(StackError::InvalidTag { .. })
    ));
}

#[test]
fn test_duplicate_logical_id() {
    let mut builder = StackBuilder::new("TestStack", StackProps::default()).unwrap();
    builder.add("Role/Resource", role()).unwrap();
    assert!(matches!(
        builder.add("Role/Resource", role()),
        Err(StackError::DuplicateLogicalId(_))
    ));
}

#[test]
fn test_forward_reference_rejected() {
    let mut builder = StackBuilder::new("TestStack", StackProps::default()).unwrap();
    let future = builder.logical_id("Later/Resource");
    let result = builder.add_output("Early", Expr::Ref(future), None);
    assert!(matches!(result, Err(StackError::UnresolvedReference { .. })));
}

#[test]
fn test_duplicate_output_rejected() {
    let mut builder = StackBuilder::new("TestStack", StackProps::default()).unwrap();
    let role = builder.add("Role/Resource", role()).unwrap();
    builder.add_output("RoleArn", role.attr("Arn"), None).unwrap();
    assert!(matches!(
        builder.add_output("RoleArn", role.attr("Arn"), None),
        Err(StackError::DuplicateOutput(_))
    ));
}

#[test]
fn test_subnet_space_exhausted() {
    let mut builder = StackBuilder::new("TestStack", StackProps::default()).unwrap();
    let props = VpcProps {
        cidr: "10.0.0.0/24".to_string(),
        max_azs: 3,
        subnet_configuration: vec![
            SubnetConfiguration {
                cidr_mask: Some(26),
                ..SubnetConfiguration::new("Public", SubnetType::Public)
            },
            SubnetConfiguration {
                cidr_mask: Some(26),
                ..SubnetConfiguration::new("Private", SubnetType::PrivateWithEgress)
            },
        ],
        ..VpcProps::default()
    };
    assert!(matches!(
        Vpc::new(&mut builder, "VPC", props),
        Err(StackError::InvalidProperty { .. })
    ));
}
