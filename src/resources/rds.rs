//! # RDS Resources

use super::Tag;
use crate::graph::Expr;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CfnDbSubnetGroup {
    #[serde(rename = "DBSubnetGroupDescription")]
    pub description: String,
    #[serde(rename = "SubnetIds")]
    pub subnet_ids: Vec<Expr>,
    #[serde(rename = "Tags", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnDbSubnetGroup, "AWS::RDS::DBSubnetGroup", tagged);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnDbInstance {
    pub allocated_storage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_retention_period: Option<u32>,
    pub copy_tags_to_snapshot: bool,
    #[serde(rename = "DBInstanceClass")]
    pub db_instance_class: String,
    #[serde(rename = "DBName", skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(rename = "DBSubnetGroupName")]
    pub db_subnet_group_name: Expr,
    pub delete_automated_backups: bool,
    #[serde(rename = "EnableIAMDatabaseAuthentication")]
    pub enable_iam_database_authentication: bool,
    pub engine: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    pub master_user_password: Expr,
    pub master_username: Expr,
    #[serde(rename = "MultiAZ", skip_serializing_if = "Option::is_none")]
    pub multi_az: Option<bool>,
    pub publicly_accessible: bool,
    pub storage_type: String,
    #[serde(rename = "VPCSecurityGroups")]
    pub vpc_security_groups: Vec<Expr>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnDbInstance, "AWS::RDS::DBInstance", tagged);
