//! Lambda + RDS Stack Library
//!
//! Declares a VPC, a MySQL database with IAM authentication and a Rust
//! Lambda function allowed to connect to it, and synthesizes the result into
//! a CloudFormation template plus asset manifest.
//!
//! ```no_run
//! use lambda_rds_stack::prelude::*;
//!
//! let graph = define("LambdaRDSStack", StackProps::default())?;
//! let template = graph.to_template().to_json()?;
//! # Ok::<(), lambda_rds_stack::error::StackError>(())
//! ```
//!
//! Tests live beside each module and under `tests/`.

pub mod config;
pub mod constants;
pub mod constructs;
pub mod error;
pub mod graph;
pub mod observability;
pub mod prelude;
pub mod resources;
pub mod stack;
pub mod synth;
