//! # Stack
//!
//! The Lambda + MySQL stack: a VPC, a database with IAM authentication and a
//! Rust function allowed to connect to it as a dedicated database user.
//!
//! ## Module Structure
//!
//! - `props.rs` - deployment-wide properties and name validation
//! - `definition.rs` - the declaration sequence
//! - `bootstrap.rs` - one-time SQL for the database user

mod bootstrap;
mod definition;
mod props;

pub use bootstrap::bootstrap_sql;
pub use definition::{define, define_in};
pub use props::{validate_stack_name, Environment, StackProps};

/// Database created inside the instance
pub const DB_NAME: &str = "foo";

/// Admin login stored in the generated secret
pub const DB_ADMIN_USERNAME: &str = "admin";

/// Database user the function authenticates as
pub const DB_USERNAME: &str = "lambda";

/// Function source directory, relative to the project root
pub const FUNCTION_ENTRY: &str = "lambda";

pub const FUNCTION_TIMEOUT_SECS: u64 = 60;

/// Name of the exported function ARN
pub const OUTPUT_NAME: &str = "LambdaFunctionARN";
