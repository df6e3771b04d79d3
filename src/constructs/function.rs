//! # Rust Function
//!
//! A Lambda function built from a Cargo project with a custom runtime.
//! Declares the execution role, the function itself and the file asset
//! carrying its code.

use crate::constants::{BOOTSTRAP_QUALIFIER, CUSTOM_RUNTIME_HANDLER, DEFAULT_RUST_BUILD_IMAGE};
use crate::constructs::asset::fingerprint;
use crate::constructs::database::Grantable;
use crate::constructs::network::{SubnetSelection, SubnetType, Vpc};
use crate::constructs::security::{Connectable, Connections, SecurityGroup, SecurityGroupProps};
use crate::error::{Result, StackError};
use crate::graph::{Expr, FileAsset, ResourceOptions, ResourceRef, StackBuilder};
use crate::resources::iam::{CfnRole, PolicyDocument, Statement};
use crate::resources::lambda::{CfnFunction, Code, Environment, VpcConfig};
use cfn_arns::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

static ENV_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").expect("Failed to compile environment key regex")
});

/// Variables the Lambda service sets itself
const RESERVED_ENV_KEYS: &[&str] = &[
    "_HANDLER",
    "_X_AMZN_TRACE_ID",
    "AWS_ACCESS_KEY",
    "AWS_ACCESS_KEY_ID",
    "AWS_DEFAULT_REGION",
    "AWS_EXECUTION_ENV",
    "AWS_LAMBDA_FUNCTION_MEMORY_SIZE",
    "AWS_LAMBDA_FUNCTION_NAME",
    "AWS_LAMBDA_FUNCTION_VERSION",
    "AWS_LAMBDA_LOG_GROUP_NAME",
    "AWS_LAMBDA_LOG_STREAM_NAME",
    "AWS_LAMBDA_RUNTIME_API",
    "AWS_REGION",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "LAMBDA_RUNTIME_DIR",
    "LAMBDA_TASK_ROOT",
];

const MAX_TIMEOUT: Duration = Duration::from_secs(900);

/// Custom runtime the binary is deployed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    ProvidedAl2023,
    ProvidedAl2,
}

impl Runtime {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::ProvidedAl2023 => "provided.al2023",
            Runtime::ProvidedAl2 => "provided.al2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    Arm64,
}

impl Architecture {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
        }
    }

    /// Cargo target the binary is compiled for
    #[must_use]
    pub fn target_triple(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64-unknown-linux-gnu",
            Architecture::Arm64 => "aarch64-unknown-linux-gnu",
        }
    }
}

/// How the function binary is compiled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlingOptions {
    /// Always build inside the container image, even if a local toolchain exists
    pub force_docker_bundling: bool,
    pub docker_image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cargo_lambda_flags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl Default for BundlingOptions {
    fn default() -> Self {
        Self {
            force_docker_bundling: false,
            docker_image: DEFAULT_RUST_BUILD_IMAGE.to_string(),
            cargo_lambda_flags: Vec::new(),
            environment: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RustFunctionProps<'a> {
    /// Cargo project directory, relative to the project root
    pub entry: String,
    /// Binary to package when the project builds several
    pub binary_name: Option<String>,
    pub vpc: Option<&'a Vpc>,
    pub vpc_subnets: Option<SubnetSelection>,
    pub security_groups: Vec<&'a SecurityGroup>,
    pub environment: BTreeMap<String, Expr>,
    pub bundling: BundlingOptions,
    pub runtime: Runtime,
    pub architecture: Architecture,
    pub timeout: Duration,
    pub memory_size: Option<u32>,
}

impl RustFunctionProps<'_> {
    #[must_use]
    pub fn new(entry: &str) -> Self {
        Self {
            entry: entry.to_string(),
            binary_name: None,
            vpc: None,
            vpc_subnets: None,
            security_groups: Vec::new(),
            environment: BTreeMap::new(),
            bundling: BundlingOptions::default(),
            runtime: Runtime::ProvidedAl2023,
            architecture: Architecture::X86_64,
            timeout: Duration::from_secs(3),
            memory_size: None,
        }
    }
}

/// Declared function
#[derive(Debug, Clone)]
pub struct RustFunction {
    resource: ResourceRef,
    role: ResourceRef,
    path: String,
    asset: FileAsset,
    connections: Connections,
}

impl RustFunction {
    /// Declare the function; sources are read from `project_dir/<entry>`
    /// to fingerprint the code asset
    pub fn new(
        builder: &mut StackBuilder,
        project_dir: &Path,
        id: &str,
        props: RustFunctionProps<'_>,
    ) -> Result<Self> {
        validate(id, &props)?;

        let mut security_groups: Vec<SecurityGroup> =
            props.security_groups.iter().map(|sg| (*sg).clone()).collect();
        let vpc_config = match props.vpc {
            Some(vpc) => {
                let selection = props.vpc_subnets.clone().unwrap_or_default();
                let selected = vpc.select_subnets(&selection)?;
                if selected.subnet_type == SubnetType::Public {
                    warn!(function = id, "Function placed in public subnets gets no public IP");
                }
                if security_groups.is_empty() {
                    let description = format!(
                        "Automatic security group for Lambda Function {}{id}",
                        builder.stack_name()
                    );
                    security_groups.push(SecurityGroup::new(
                        builder,
                        &format!("{id}/SecurityGroup"),
                        SecurityGroupProps {
                            description: Some(description),
                            ..SecurityGroupProps::new(vpc)
                        },
                    )?);
                }
                Some(VpcConfig {
                    security_group_ids: security_groups
                        .iter()
                        .map(SecurityGroup::group_id)
                        .collect(),
                    subnet_ids: selected.subnet_ids,
                })
            }
            None => None,
        };

        let role = builder.add(
            &format!("{id}/ServiceRole/Resource"),
            CfnRole {
                assume_role_policy_document: PolicyDocument::new(vec![Statement::assume_role(
                    "lambda.amazonaws.com",
                )]),
                managed_policy_arns: managed_policies(vpc_config.is_some())?,
                tags: Vec::new(),
            },
        )?;

        let bundling = serde_json::to_value(BundlingManifest {
            options: &props.bundling,
            binary_name: props.binary_name.as_deref(),
            target: props.architecture.target_triple(),
        })?;
        let hash = fingerprint(project_dir, &props.entry, &bundling)?;
        let asset = FileAsset {
            hash: hash.clone(),
            source_path: props.entry.clone(),
            packaging: "zip".to_string(),
            bundling,
        };

        let path = format!("{id}/Resource");
        let resource = builder.add_with(
            &path,
            CfnFunction {
                architectures: vec![props.architecture.as_str().to_string()],
                code: Code {
                    s3_bucket: Expr::Sub(format!(
                        "cdk-{BOOTSTRAP_QUALIFIER}-assets-${{AWS::AccountId}}-${{AWS::Region}}"
                    )),
                    s3_key: asset.object_key(),
                },
                environment: (!props.environment.is_empty()).then(|| Environment {
                    variables: props.environment.clone(),
                }),
                handler: CUSTOM_RUNTIME_HANDLER.to_string(),
                memory_size: props.memory_size,
                role: role.attr("Arn"),
                runtime: props.runtime.as_str().to_string(),
                timeout: u32::try_from(props.timeout.as_secs()).unwrap_or(u32::MAX),
                vpc_config,
                tags: Vec::new(),
            },
            ResourceOptions::default()
                .depends_on(&role)
                .metadata("aws:asset:path", serde_json::json!(format!("asset.{hash}")))
                .metadata("aws:asset:is-bundled", serde_json::json!(true))
                .metadata("aws:asset:property", serde_json::json!("Code")),
        )?;
        builder.add_asset(asset.clone());

        debug!(function = id, asset = %hash, "Function code fingerprinted");
        info!(
            function = id,
            runtime = props.runtime.as_str(),
            timeout_secs = props.timeout.as_secs(),
            "Declared function"
        );

        Ok(Self {
            resource,
            role,
            path: id.to_string(),
            asset,
            connections: Connections::new(security_groups, None),
        })
    }

    #[must_use]
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    #[must_use]
    pub fn function_arn(&self) -> Expr {
        self.resource.attr("Arn")
    }

    #[must_use]
    pub fn function_name(&self) -> Expr {
        self.resource.reference()
    }

    #[must_use]
    pub fn role(&self) -> &ResourceRef {
        &self.role
    }

    #[must_use]
    pub fn asset(&self) -> &FileAsset {
        &self.asset
    }
}

impl Connectable for RustFunction {
    fn connections(&self) -> &Connections {
        &self.connections
    }
}

impl Grantable for RustFunction {
    fn grant_role(&self) -> &ResourceRef {
        &self.role
    }

    fn grant_path(&self) -> &str {
        &self.path
    }
}

/// Everything that shapes the built artifact
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BundlingManifest<'a> {
    #[serde(flatten)]
    options: &'a BundlingOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    binary_name: Option<&'a str>,
    target: &'a str,
}

fn managed_policies(in_vpc: bool) -> Result<Vec<Expr>> {
    let mut names = vec!["service-role/AWSLambdaBasicExecutionRole"];
    if in_vpc {
        names.push("service-role/AWSLambdaVPCAccessExecutionRole");
    }
    names
        .into_iter()
        .map(|name| {
            let parts = ArnBuilder::new()
                .service(Service::Iam)
                .account("aws")
                .resource_type("policy")
                .resource(name)
                .build_parts()?;
            Expr::from_arn_parts(parts, &[])
        })
        .collect()
}

fn validate(id: &str, props: &RustFunctionProps<'_>) -> Result<()> {
    let entry = PathBuf::from(&props.entry);
    if props.entry.is_empty() || entry.is_absolute() {
        return Err(StackError::invalid_property(
            id,
            "entry",
            format!("{:?} must be a relative project path", props.entry),
        ));
    }
    if props.timeout.is_zero() || props.timeout > MAX_TIMEOUT || props.timeout.subsec_nanos() != 0 {
        return Err(StackError::invalid_property(
            id,
            "timeout",
            format!("{:?} must be whole seconds between 1 and 900", props.timeout),
        ));
    }
    if let Some(memory) = props.memory_size {
        if !(128..=10240).contains(&memory) {
            return Err(StackError::invalid_property(
                id,
                "memorySize",
                format!("{memory} MB must be between 128 and 10240"),
            ));
        }
    }
    if props.vpc.is_none() && (!props.security_groups.is_empty() || props.vpc_subnets.is_some()) {
        return Err(StackError::invalid_property(
            id,
            "vpc",
            "security groups and subnets need a VPC",
        ));
    }
    for key in props.environment.keys() {
        if !ENV_KEY.is_match(key) {
            return Err(StackError::invalid_property(
                id,
                "environment",
                format!("{key:?} is not a valid variable name"),
            ));
        }
        if RESERVED_ENV_KEYS.contains(&key.as_str()) {
            return Err(StackError::invalid_property(
                id,
                "environment",
                format!("{key} is reserved by the runtime"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructs::network::VpcProps;
    use crate::stack::StackProps;

    fn builder() -> StackBuilder {
        StackBuilder::new("TestStack", StackProps::default()).unwrap()
    }

    #[test]
    fn test_function_outside_vpc() {
        let mut b = builder();
        let props = RustFunctionProps {
            timeout: Duration::from_secs(60),
            ..RustFunctionProps::new("lambda")
        };
        let function = RustFunction::new(&mut b, Path::new("."), "fn", props).unwrap();
        assert_eq!(function.asset().object_key().len(), 68);

        let graph = b.build();
        let resource = graph.resource_at("fn/Resource").unwrap();
        assert_eq!(resource.property("Handler").unwrap(), "bootstrap");
        assert_eq!(resource.property("Runtime").unwrap(), "provided.al2023");
        assert_eq!(resource.property("Timeout").unwrap(), 60);
        assert!(resource.property("VpcConfig").is_none());
        assert!(resource.property("Environment").is_none());
        assert_eq!(resource.depends_on(), &[function.role().logical_id().clone()]);

        let role = graph.resource_at("fn/ServiceRole/Resource").unwrap();
        assert_eq!(role.property("ManagedPolicyArns").unwrap().as_array().unwrap().len(), 1);
        assert_eq!(graph.assets().len(), 1);
    }

    #[test]
    fn test_vpc_function_gets_vpc_access_policy_and_group() {
        let mut b = builder();
        let vpc = Vpc::new(&mut b, "VPC", VpcProps::default()).unwrap();
        let props = RustFunctionProps {
            vpc: Some(&vpc),
            ..RustFunctionProps::new("lambda")
        };
        let function = RustFunction::new(&mut b, Path::new("."), "fn", props).unwrap();
        assert_eq!(function.connections().security_groups().len(), 1);

        let graph = b.build();
        let role = graph.resource_at("fn/ServiceRole/Resource").unwrap();
        let policies = role.property("ManagedPolicyArns").unwrap().to_string();
        assert!(policies.contains("AWSLambdaVPCAccessExecutionRole"));
        assert!(graph.resource_at("fn/SecurityGroup/Resource").is_some());

        let vpc_config = graph.resource_at("fn/Resource").unwrap().property("VpcConfig").unwrap();
        assert_eq!(vpc_config["SubnetIds"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_reserved_environment_key() {
        let mut b = builder();
        let mut props = RustFunctionProps::new("lambda");
        props.environment.insert("AWS_REGION".to_string(), Expr::from("x"));
        assert!(RustFunction::new(&mut b, Path::new("."), "fn", props).is_err());
    }

    #[test]
    fn test_rejects_timeout_out_of_range() {
        let mut b = builder();
        let props = RustFunctionProps {
            timeout: Duration::from_secs(901),
            ..RustFunctionProps::new("lambda")
        };
        assert!(RustFunction::new(&mut b, Path::new("."), "fn", props).is_err());
    }

    #[test]
    fn test_security_groups_need_vpc() {
        let mut b = builder();
        let vpc = Vpc::new(&mut b, "VPC", VpcProps::default()).unwrap();
        let sg = SecurityGroup::new(&mut b, "SG", SecurityGroupProps::new(&vpc)).unwrap();
        let props = RustFunctionProps {
            security_groups: vec![&sg],
            ..RustFunctionProps::new("lambda")
        };
        assert!(RustFunction::new(&mut b, Path::new("."), "fn", props).is_err());
    }

    #[test]
    fn test_bundling_options_change_code_key() {
        let mut a = builder();
        let mut b = builder();
        let plain =
            RustFunction::new(&mut a, Path::new("."), "fn", RustFunctionProps::new("lambda"))
                .unwrap();
        let docker = RustFunction::new(
            &mut b,
            Path::new("."),
            "fn",
            RustFunctionProps {
                bundling: BundlingOptions {
                    force_docker_bundling: true,
                    ..BundlingOptions::default()
                },
                ..RustFunctionProps::new("lambda")
            },
        )
        .unwrap();
        assert_ne!(plain.asset().hash, docker.asset().hash);
    }
}
