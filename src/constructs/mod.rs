//! # Constructs
//!
//! Higher-level declarations that expand into several resources each.
//!
//! ## Module Structure
//!
//! - `cidr.rs` - IPv4 ranges and subnet allocation
//! - `network.rs` - VPC, subnet groups, gateways
//! - `security.rs` - security groups, ports, peers, connections
//! - `database.rs` - database instance, generated credentials, connect grants
//! - `function.rs` - Rust Lambda function and its execution role
//! - `asset.rs` - code asset fingerprints

pub mod asset;
pub mod cidr;
pub mod database;
pub mod function;
pub mod network;
pub mod security;

pub use database::{Credentials, DatabaseInstance, DatabaseInstanceProps, Engine, Grantable};
pub use function::{Architecture, BundlingOptions, Runtime, RustFunction, RustFunctionProps};
pub use network::{SubnetConfiguration, SubnetSelection, SubnetType, Vpc, VpcProps};
pub use security::{
    Connectable, Connections, Peer, Port, Protocol, SecurityGroup, SecurityGroupProps,
};
