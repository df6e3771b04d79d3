//! # Constants
//!
//! Shared constants used throughout the stack definition.
//!
//! These values represent the defaults applied when neither the environment
//! nor the command line override them.

/// Stack name used when none is configured
pub const DEFAULT_STACK_NAME: &str = "LambdaRDSStack";

/// Directory the cloud assembly is written to
pub const DEFAULT_OUTPUT_DIR: &str = "cdk.out";

/// Template rendering used when none is configured
pub const DEFAULT_OUTPUT_FORMAT: &str = "json";

/// Default log level for the CLI
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Address range of a VPC declared without one
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";

/// Availability zones used by a VPC declared without a limit
pub const DEFAULT_MAX_AZS: usize = 2;

/// Smallest subnet CloudFormation accepts (a /28)
pub const MAX_SUBNET_PREFIX: u8 = 28;

/// Largest VPC CloudFormation accepts (a /16)
pub const MIN_VPC_PREFIX: u8 = 16;

/// Qualifier of the bootstrap resources the asset bucket belongs to
pub const BOOTSTRAP_QUALIFIER: &str = "hnb659fds";

/// Oldest bootstrap stack version that can host file assets
pub const MIN_BOOTSTRAP_VERSION: u32 = 6;

/// Instance class of a database declared without one
pub const DEFAULT_DB_INSTANCE_CLASS: &str = "db.t3.large";

/// Allocated storage (GiB) of a database declared without one
pub const DEFAULT_DB_ALLOCATED_STORAGE: &str = "100";

/// Length of generated database admin passwords
pub const GENERATED_PASSWORD_LENGTH: u32 = 30;

/// Characters excluded from generated database passwords
pub const PASSWORD_EXCLUDE_CHARACTERS: &str = " %+~`#$&*()|[]{}:;<>?!'/@\"\\";

/// Container image used to cross-compile Rust functions
pub const DEFAULT_RUST_BUILD_IMAGE: &str = "public.ecr.aws/sam/build-provided.al2023";

/// Handler name of custom-runtime functions
pub const CUSTOM_RUNTIME_HANDLER: &str = "bootstrap";
