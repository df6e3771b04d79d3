//! # Lambda Resources

use super::Tag;
use crate::graph::Expr;
use serde::Serialize;
use std::collections::BTreeMap;

/// Code location in the asset bucket
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Code {
    pub s3_bucket: Expr,
    pub s3_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub variables: BTreeMap<String, Expr>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcConfig {
    pub security_group_ids: Vec<Expr>,
    pub subnet_ids: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnFunction {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub architectures: Vec<String>,
    pub code: Code,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u32>,
    pub role: Expr,
    pub runtime: String,
    pub timeout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_config: Option<VpcConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnFunction, "AWS::Lambda::Function", tagged);
