//! Error types for ArnBuilder

use thiserror::Error;

/// Errors that can occur during ARN construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArnBuilderError {
    /// Required parameter is missing
    #[error("Missing required parameter: {0}")]
    MissingRequiredParameter(String),

    /// A segment contains a character that would break the ARN layout
    #[error("Invalid value for {field}: {value:?}")]
    InvalidSegment { field: String, value: String },

    /// A region was supplied for a service whose ARNs carry no region
    #[error("Service {0} is global and does not take a region")]
    RegionForGlobalService(String),

    /// A literal ARN was requested but a segment is only known at deploy time
    #[error("Segment {0} is only known at deploy time; use a parts or sub rendering")]
    UnresolvedSegment(String),
}
