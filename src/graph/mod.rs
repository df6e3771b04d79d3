//! # Resource Graph
//!
//! Explicit graph builder and the immutable graph it produces.
//!
//! Declarations are registered on a [`StackBuilder`] in program order. A
//! declaration may only reference resources that were registered before it,
//! so the finished [`ResourceGraph`] is acyclic by construction and its
//! declaration order is a valid creation order.
//!
//! ## Module Structure
//!
//! - `builder.rs` - `StackBuilder`, `ResourceRef`, `ResourceOptions`
//! - `expr.rs` - deferred values (`Ref`, `Fn::GetAtt`, ...)
//! - `logical_id.rs` - template keys derived from construct paths
//! - `model.rs` - `Resource`, `Output`, `FileAsset`, `ResourceGraph`

mod builder;
mod expr;
mod logical_id;
mod model;

pub use builder::{ResourceOptions, ResourceRef, StackBuilder};
pub use expr::{Expr, Pseudo};
pub use logical_id::LogicalId;
pub use model::{FileAsset, Output, RemovalPolicy, Resource, ResourceGraph};
