//! Output format definitions for ArnBuilder
//!
//! Different consumers need different renderings:
//! - Parts: pieces for an `Fn::Join` with an empty delimiter
//! - Sub: a single `Fn::Sub` template string
//! - Literal: a plain ARN, only when every segment is known

/// Output format for ARN construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArnFormat {
    /// `["arn:", {"Ref": "AWS::Partition"}, ":rds-db:", ...]`
    Parts,

    /// `"arn:${AWS::Partition}:rds-db:${AWS::Region}:..."`
    Sub,

    /// `"arn:aws:iam::aws:policy/..."`
    Literal,
}

/// One piece of a joined ARN
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArnPart {
    Text(String),
    /// `AWS::Partition` of the deploying stack
    Partition,
    /// `AWS::Region` of the deploying stack
    Region,
    /// `AWS::AccountId` of the deploying stack
    Account,
    /// Caller-resolved placeholder (an attribute of another resource)
    Token(String),
}

/// Rendered ARN, shaped by the requested format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArnRendering {
    Parts(Vec<ArnPart>),
    Sub(String),
    Literal(String),
}
