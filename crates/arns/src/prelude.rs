//! # Prelude
//!
//! Re-exports commonly used types for convenience.
//!
//! ```rust
//! use cfn_arns::prelude::*;
//!
//! let arn = ArnBuilder::new()
//!     .service(Service::Iam)
//!     .account("aws")
//!     .resource_type("policy")
//!     .resource("service-role/AWSLambdaBasicExecutionRole")
//!     .build_literal();
//! ```

pub use crate::builder::{ArnBuilder, Segment};
pub use crate::errors::ArnBuilderError;
pub use crate::formats::{ArnFormat, ArnPart, ArnRendering};
pub use crate::service::Service;
