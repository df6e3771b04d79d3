//! # EC2 Networking Resources

use super::Tag;
use crate::graph::Expr;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnVpc {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub instance_tenancy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnVpc, "AWS::EC2::VPC", tagged);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSubnet {
    pub availability_zone: Expr,
    pub cidr_block: String,
    pub map_public_ip_on_launch: bool,
    pub vpc_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnSubnet, "AWS::EC2::Subnet", tagged);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRouteTable {
    pub vpc_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnRouteTable, "AWS::EC2::RouteTable", tagged);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSubnetRouteTableAssociation {
    pub route_table_id: Expr,
    pub subnet_id: Expr,
}
cfn_resource!(
    CfnSubnetRouteTableAssociation,
    "AWS::EC2::SubnetRouteTableAssociation"
);

/// Default route; exactly one of the gateway fields is set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRoute {
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Expr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<Expr>,
    pub route_table_id: Expr,
}
cfn_resource!(CfnRoute, "AWS::EC2::Route");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnInternetGateway {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnInternetGateway, "AWS::EC2::InternetGateway", tagged);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnVpcGatewayAttachment {
    pub internet_gateway_id: Expr,
    pub vpc_id: Expr,
}
cfn_resource!(CfnVpcGatewayAttachment, "AWS::EC2::VPCGatewayAttachment");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnEip {
    pub domain: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnEip, "AWS::EC2::EIP", tagged);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnNatGateway {
    pub allocation_id: Expr,
    pub subnet_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnNatGateway, "AWS::EC2::NatGateway", tagged);

/// Inline ingress or egress rule on a security group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_port: Option<Expr>,
    pub ip_protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_port: Option<Expr>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSecurityGroup {
    pub group_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_egress: Vec<SecurityGroupRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ingress: Vec<SecurityGroupRule>,
    pub vpc_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnSecurityGroup, "AWS::EC2::SecurityGroup", tagged);

/// Standalone ingress rule, used when the peer is another group
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSecurityGroupIngress {
    pub ip_protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_ip: Option<String>,
    pub description: String,
    pub from_port: Expr,
    pub group_id: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_security_group_id: Option<Expr>,
    pub to_port: Expr,
}
cfn_resource!(CfnSecurityGroupIngress, "AWS::EC2::SecurityGroupIngress");

/// Standalone egress rule
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSecurityGroupEgress {
    pub ip_protocol: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_security_group_id: Option<Expr>,
    pub from_port: Expr,
    pub group_id: Expr,
    pub to_port: Expr,
}
cfn_resource!(CfnSecurityGroupEgress, "AWS::EC2::SecurityGroupEgress");
