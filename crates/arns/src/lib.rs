//! Shared ARN construction for CloudFormation templates
//!
//! This crate centralizes how Amazon Resource Names are assembled so that
//! IAM policies, managed-policy attachments and grants all agree on the
//! exact shape of each ARN.
//!
//! ## Quick Start
//!
//! ```rust
//! use cfn_arns::prelude::*;
//!
//! let parts = ArnBuilder::new()
//!     .service(Service::RdsDb)
//!     .resource_type("dbuser")
//!     .resource_token("DbiResourceId")
//!     .resource_suffix("/lambda")
//!     .build_parts();
//! ```
//!
//! ## ArnBuilder
//!
//! The `ArnBuilder` produces either a list of parts (literal text, pseudo
//! parameters and caller-resolved tokens) suitable for `Fn::Join`, an
//! `Fn::Sub` template string, or a literal ARN when every segment is known.

pub mod builder;
pub mod errors;
pub mod formats;
pub mod prelude;
pub mod service;
