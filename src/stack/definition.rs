//! Declaration sequence of the stack.
//!
//! Order matters: every resource is declared after everything it refers to.

use super::{
    StackProps, DB_ADMIN_USERNAME, DB_NAME, DB_USERNAME, FUNCTION_ENTRY, FUNCTION_TIMEOUT_SECS,
    OUTPUT_NAME,
};
use crate::constructs::{
    BundlingOptions, Connectable, Credentials, DatabaseInstance, DatabaseInstanceProps, Engine,
    Port, RustFunction, RustFunctionProps, SecurityGroup, SecurityGroupProps, SubnetSelection,
    SubnetType, Vpc, VpcProps,
};
use crate::error::Result;
use crate::graph::{Expr, RemovalPolicy, ResourceGraph, StackBuilder};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Declare the stack, reading function sources relative to the current directory
pub fn define(name: &str, props: StackProps) -> Result<ResourceGraph> {
    define_in(Path::new("."), name, props)
}

/// Declare the stack, reading function sources relative to `project_dir`
pub fn define_in(project_dir: &Path, name: &str, props: StackProps) -> Result<ResourceGraph> {
    info!(stack = name, "Defining stack");
    let mut builder = StackBuilder::new(name, props)?;

    let vpc = Vpc::new(&mut builder, "VPC", VpcProps::default())?;

    let database = DatabaseInstance::new(
        &mut builder,
        "MySql",
        DatabaseInstanceProps {
            vpc_subnets: SubnetSelection::of_type(SubnetType::PrivateWithEgress),
            database_name: Some(DB_NAME.to_string()),
            iam_authentication: true,
            delete_automated_backups: true,
            removal_policy: RemovalPolicy::Destroy,
            ..DatabaseInstanceProps::new(
                Engine::MySql,
                &vpc,
                Credentials::from_generated_secret(DB_ADMIN_USERNAME),
            )
        },
    )?;
    database
        .connections()
        .allow_from_any_ipv4(&mut builder, &Port::all_tcp())?;

    let lambda_sg = SecurityGroup::new(
        &mut builder,
        "LambdaSG",
        SecurityGroupProps {
            security_group_name: Some("LambdaSG".to_string()),
            ..SecurityGroupProps::new(&vpc)
        },
    )?;

    let environment = BTreeMap::from([
        ("DB_HOSTNAME".to_string(), database.endpoint_address()),
        ("DB_PORT".to_string(), database.endpoint_port()),
        ("DB_NAME".to_string(), Expr::from(DB_NAME)),
        ("DB_USERNAME".to_string(), Expr::from(DB_USERNAME)),
    ]);

    let function = RustFunction::new(
        &mut builder,
        project_dir,
        "lambda",
        RustFunctionProps {
            vpc: Some(&vpc),
            vpc_subnets: Some(SubnetSelection::of_type(SubnetType::PrivateWithEgress)),
            security_groups: vec![&lambda_sg],
            environment,
            bundling: BundlingOptions {
                force_docker_bundling: true,
                ..BundlingOptions::default()
            },
            timeout: Duration::from_secs(FUNCTION_TIMEOUT_SECS),
            ..RustFunctionProps::new(FUNCTION_ENTRY)
        },
    )?;

    database.grant_connect(&mut builder, &function, DB_USERNAME)?;
    database
        .connections()
        .allow_default_port_from(&mut builder, &function)?;
    warn!(
        database = "MySql",
        "Database security group accepts all TCP from 0.0.0.0/0, \
         which already covers the function's port rule"
    );

    builder.add_output(OUTPUT_NAME, function.function_arn(), None)?;

    let graph = builder.build();
    info!(
        stack = name,
        resources = graph.resources().len(),
        "Stack defined"
    );
    Ok(graph)
}
