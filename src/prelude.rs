//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use lambda_rds_stack::prelude::*;
//! ```

// Stack definition
pub use crate::stack::{bootstrap_sql, define, define_in, Environment, StackProps};

// Graph model
pub use crate::graph::{Expr, LogicalId, RemovalPolicy, ResourceGraph, ResourceRef, StackBuilder};

// Constructs
pub use crate::constructs::{
    Connectable, DatabaseInstance, Grantable, Port, RustFunction, SecurityGroup, SubnetType, Vpc,
};

// Synthesis
pub use crate::synth::{write_assembly, OutputFormat, Template};

// Config and errors
pub use crate::config::SynthConfig;
pub use crate::error::{Result, StackError};
