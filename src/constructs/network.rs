//! # VPC
//!
//! Expands a VPC declaration into its address range, per-zone subnets,
//! route tables, internet gateway and NAT gateways.
//!
//! Subnet groups are laid out in declaration order: every group gets one
//! subnet per availability zone, and groups without an explicit mask share
//! the space left by those with one.

use crate::constants::{DEFAULT_MAX_AZS, DEFAULT_VPC_CIDR, MIN_VPC_PREFIX};
use crate::constructs::cidr::{equal_share_prefix, CidrAllocator, Ipv4Cidr};
use crate::error::{Result, StackError};
use crate::graph::{Expr, ResourceOptions, ResourceRef, StackBuilder};
use crate::resources::ec2::{
    CfnEip, CfnInternetGateway, CfnNatGateway, CfnRoute, CfnRouteTable, CfnSubnet,
    CfnSubnetRouteTableAssociation, CfnVpc, CfnVpcGatewayAttachment,
};
use crate::resources::Tag;
use tracing::{debug, info};

const DEFAULT_ROUTE: &str = "0.0.0.0/0";

/// Reachability class of a subnet group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetType {
    /// Routed to the internet gateway
    Public,
    /// Outbound only, through a NAT gateway
    PrivateWithEgress,
    /// No route out of the VPC
    PrivateIsolated,
}

impl SubnetType {
    /// Value of the `aws-cdk:subnet-type` tag
    #[must_use]
    pub fn tag_value(&self) -> &'static str {
        match self {
            SubnetType::Public => "Public",
            SubnetType::PrivateWithEgress => "Private",
            SubnetType::PrivateIsolated => "Isolated",
        }
    }
}

/// One subnet group, replicated across availability zones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetConfiguration {
    pub name: String,
    pub subnet_type: SubnetType,
    /// Fixed prefix length; unset groups split the remaining space evenly
    pub cidr_mask: Option<u8>,
}

impl SubnetConfiguration {
    #[must_use]
    pub fn new(name: &str, subnet_type: SubnetType) -> Self {
        Self {
            name: name.to_string(),
            subnet_type,
            cidr_mask: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VpcProps {
    pub cidr: String,
    pub max_azs: usize,
    /// NAT gateways to create; one per zone when unset
    pub nat_gateways: Option<usize>,
    pub subnet_configuration: Vec<SubnetConfiguration>,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
}

impl Default for VpcProps {
    fn default() -> Self {
        Self {
            cidr: DEFAULT_VPC_CIDR.to_string(),
            max_azs: DEFAULT_MAX_AZS,
            nat_gateways: None,
            subnet_configuration: vec![
                SubnetConfiguration::new("Public", SubnetType::Public),
                SubnetConfiguration::new("Private", SubnetType::PrivateWithEgress),
            ],
            enable_dns_hostnames: true,
            enable_dns_support: true,
        }
    }
}

/// Declared subnet
#[derive(Debug, Clone)]
pub struct Subnet {
    resource: ResourceRef,
    route_table: ResourceRef,
    group_name: String,
    subnet_type: SubnetType,
    zone_index: usize,
    cidr: Ipv4Cidr,
}

impl Subnet {
    #[must_use]
    pub fn subnet_id(&self) -> Expr {
        self.resource.reference()
    }

    #[must_use]
    pub fn route_table_id(&self) -> Expr {
        self.route_table.reference()
    }

    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    #[must_use]
    pub fn subnet_type(&self) -> SubnetType {
        self.subnet_type
    }

    /// Position of the subnet's zone in the region's zone list
    #[must_use]
    pub fn zone_index(&self) -> usize {
        self.zone_index
    }

    #[must_use]
    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }
}

/// Which subnets a resource is placed in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetSelection {
    pub subnet_type: Option<SubnetType>,
    pub group_name: Option<String>,
}

impl SubnetSelection {
    #[must_use]
    pub fn of_type(subnet_type: SubnetType) -> Self {
        Self {
            subnet_type: Some(subnet_type),
            group_name: None,
        }
    }

    #[must_use]
    pub fn of_group(name: &str) -> Self {
        Self {
            subnet_type: None,
            group_name: Some(name.to_string()),
        }
    }
}

/// Result of [`Vpc::select_subnets`]
#[derive(Debug, Clone)]
pub struct SelectedSubnets {
    pub subnet_type: SubnetType,
    pub subnet_ids: Vec<Expr>,
}

/// Declared VPC
#[derive(Debug, Clone)]
pub struct Vpc {
    resource: ResourceRef,
    path: String,
    cidr: Ipv4Cidr,
    subnets: Vec<Subnet>,
    nat_gateways: Vec<ResourceRef>,
    internet_gateway: Option<ResourceRef>,
}

impl Vpc {
    pub fn new(builder: &mut StackBuilder, id: &str, props: VpcProps) -> Result<Self> {
        let cidr: Ipv4Cidr = props.cidr.parse()?;
        if cidr.prefix() < MIN_VPC_PREFIX {
            return Err(StackError::invalid_property(
                id,
                "cidr",
                format!("{cidr} is larger than a /{MIN_VPC_PREFIX}"),
            ));
        }
        if props.max_azs == 0 {
            return Err(StackError::invalid_property(id, "maxAzs", "at least one zone is required"));
        }
        validate_groups(id, &props.subnet_configuration)?;

        let zones = props.max_azs;
        let has_public = has_type(&props.subnet_configuration, SubnetType::Public);
        let needs_nat = has_type(&props.subnet_configuration, SubnetType::PrivateWithEgress);
        let nat_count = if needs_nat {
            props.nat_gateways.unwrap_or(zones).min(zones)
        } else {
            props.nat_gateways.unwrap_or(0)
        };
        if needs_nat && (!has_public || nat_count == 0) {
            return Err(StackError::invalid_property(
                id,
                "subnetConfiguration",
                "private subnets with egress need a public subnet group and at least one NAT gateway",
            ));
        }
        if nat_count > 0 && !has_public {
            return Err(StackError::invalid_property(
                id,
                "natGateways",
                "NAT gateways need a public subnet group",
            ));
        }

        let layout = allocate_subnets(id, cidr, zones, &props.subnet_configuration)?;

        let stack_name = builder.stack_name().to_string();
        let resource = builder.add(
            &format!("{id}/Resource"),
            CfnVpc {
                cidr_block: cidr.to_string(),
                enable_dns_hostnames: props.enable_dns_hostnames,
                enable_dns_support: props.enable_dns_support,
                instance_tenancy: "default".to_string(),
                tags: vec![Tag::new("Name", format!("{stack_name}/{id}"))],
            },
        )?;

        let mut vpc = Self {
            resource,
            path: id.to_string(),
            cidr,
            subnets: Vec::new(),
            nat_gateways: Vec::new(),
            internet_gateway: None,
        };

        let attachment = if has_public {
            let igw = builder.add(
                &format!("{id}/IGW"),
                CfnInternetGateway {
                    tags: vec![Tag::new("Name", format!("{stack_name}/{id}"))],
                },
            )?;
            let attachment = builder.add(
                &format!("{id}/VPCGW"),
                CfnVpcGatewayAttachment {
                    internet_gateway_id: igw.reference(),
                    vpc_id: vpc.vpc_id(),
                },
            )?;
            vpc.internet_gateway = Some(igw);
            Some(attachment)
        } else {
            None
        };

        // Public groups first: private routes point at their NAT gateways
        let mut groups: Vec<_> = props.subnet_configuration.iter().zip(layout).collect();
        groups.sort_by_key(|(group, _)| group.subnet_type != SubnetType::Public);
        for (group, cidrs) in groups {
            for (zone, subnet_cidr) in cidrs.into_iter().enumerate() {
                vpc.add_subnet(builder, group, zone, subnet_cidr, nat_count, attachment.as_ref())?;
            }
        }

        info!(
            vpc = %vpc.path,
            cidr = %vpc.cidr,
            zones,
            subnets = vpc.subnets.len(),
            nat_gateways = vpc.nat_gateways.len(),
            "Declared VPC"
        );
        Ok(vpc)
    }

    fn add_subnet(
        &mut self,
        builder: &mut StackBuilder,
        group: &SubnetConfiguration,
        zone: usize,
        cidr: Ipv4Cidr,
        nat_count: usize,
        attachment: Option<&ResourceRef>,
    ) -> Result<()> {
        let base = format!("{}/{}Subnet{}", self.path, group.name, zone + 1);
        let name = format!("{}/{base}", builder.stack_name());
        debug!(subnet = %base, cidr = %cidr, "Declaring subnet");

        let subnet = builder.add(
            &format!("{base}/Subnet"),
            CfnSubnet {
                availability_zone: Expr::availability_zone(zone),
                cidr_block: cidr.to_string(),
                map_public_ip_on_launch: group.subnet_type == SubnetType::Public,
                vpc_id: self.vpc_id(),
                tags: vec![
                    Tag::new("aws-cdk:subnet-name", group.name.clone()),
                    Tag::new("aws-cdk:subnet-type", group.subnet_type.tag_value()),
                    Tag::new("Name", name.clone()),
                ],
            },
        )?;
        let route_table = builder.add(
            &format!("{base}/RouteTable"),
            CfnRouteTable {
                vpc_id: self.vpc_id(),
                tags: vec![Tag::new("Name", name.clone())],
            },
        )?;
        let association = builder.add(
            &format!("{base}/RouteTableAssociation"),
            CfnSubnetRouteTableAssociation {
                route_table_id: route_table.reference(),
                subnet_id: subnet.reference(),
            },
        )?;

        match group.subnet_type {
            SubnetType::Public => {
                let (Some(igw), Some(attachment)) = (&self.internet_gateway, attachment) else {
                    return Err(StackError::invalid_property(&base, "route", "no internet gateway"));
                };
                let route = builder.add_with(
                    &format!("{base}/DefaultRoute"),
                    CfnRoute {
                        destination_cidr_block: DEFAULT_ROUTE.to_string(),
                        gateway_id: Some(igw.reference()),
                        nat_gateway_id: None,
                        route_table_id: route_table.reference(),
                    },
                    ResourceOptions::default().depends_on(attachment),
                )?;

                if self.nat_gateways.len() < nat_count {
                    let eip = builder.add(
                        &format!("{base}/EIP"),
                        CfnEip {
                            domain: "vpc".to_string(),
                            tags: vec![Tag::new("Name", name.clone())],
                        },
                    )?;
                    let nat = builder.add_with(
                        &format!("{base}/NATGateway"),
                        CfnNatGateway {
                            allocation_id: eip.attr("AllocationId"),
                            subnet_id: subnet.reference(),
                            tags: vec![Tag::new("Name", name)],
                        },
                        ResourceOptions::default()
                            .depends_on(&route)
                            .depends_on(&association),
                    )?;
                    self.nat_gateways.push(nat);
                }
            }
            SubnetType::PrivateWithEgress => {
                let nat = self
                    .nat_gateways
                    .get(zone % self.nat_gateways.len().max(1))
                    .ok_or_else(|| {
                        StackError::invalid_property(&base, "route", "no NAT gateway declared")
                    })?;
                builder.add(
                    &format!("{base}/DefaultRoute"),
                    CfnRoute {
                        destination_cidr_block: DEFAULT_ROUTE.to_string(),
                        gateway_id: None,
                        nat_gateway_id: Some(nat.reference()),
                        route_table_id: route_table.reference(),
                    },
                )?;
            }
            SubnetType::PrivateIsolated => {}
        }

        self.subnets.push(Subnet {
            resource: subnet,
            route_table,
            group_name: group.name.clone(),
            subnet_type: group.subnet_type,
            zone_index: zone,
            cidr,
        });
        Ok(())
    }

    #[must_use]
    pub fn vpc_id(&self) -> Expr {
        self.resource.reference()
    }

    #[must_use]
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    #[must_use]
    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }

    #[must_use]
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    #[must_use]
    pub fn nat_gateways(&self) -> &[ResourceRef] {
        &self.nat_gateways
    }

    /// Subnets matching `selection`
    ///
    /// An empty selection picks the most private group with egress, then
    /// isolated, then public, mirroring where compute is usually placed.
    pub fn select_subnets(&self, selection: &SubnetSelection) -> Result<SelectedSubnets> {
        let subnet_type = match (&selection.group_name, selection.subnet_type) {
            (Some(name), _) => self
                .subnets
                .iter()
                .find(|s| &s.group_name == name)
                .map(|s| s.subnet_type)
                .ok_or_else(|| {
                    StackError::invalid_property(
                        &self.path,
                        "subnets",
                        format!("no subnet group named {name:?}"),
                    )
                })?,
            (None, Some(subnet_type)) => subnet_type,
            (None, None) => [
                SubnetType::PrivateWithEgress,
                SubnetType::PrivateIsolated,
                SubnetType::Public,
            ]
            .into_iter()
            .find(|t| self.subnets.iter().any(|s| s.subnet_type == *t))
            .ok_or_else(|| {
                StackError::invalid_property(&self.path, "subnets", "VPC has no subnets")
            })?,
        };

        let subnet_ids: Vec<Expr> = self
            .subnets
            .iter()
            .filter(|s| s.subnet_type == subnet_type)
            .filter(|s| selection.group_name.as_ref().is_none_or(|name| &s.group_name == name))
            .map(Subnet::subnet_id)
            .collect();

        if subnet_ids.is_empty() {
            return Err(StackError::invalid_property(
                &self.path,
                "subnets",
                format!("no {} subnets to select", subnet_type.tag_value()),
            ));
        }

        Ok(SelectedSubnets {
            subnet_type,
            subnet_ids,
        })
    }
}

fn has_type(groups: &[SubnetConfiguration], subnet_type: SubnetType) -> bool {
    groups.iter().any(|g| g.subnet_type == subnet_type)
}

fn validate_groups(id: &str, groups: &[SubnetConfiguration]) -> Result<()> {
    if groups.is_empty() {
        return Err(StackError::invalid_property(id, "subnetConfiguration", "no subnet groups"));
    }
    for (i, group) in groups.iter().enumerate() {
        if group.name.is_empty() || !group.name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StackError::invalid_property(
                id,
                "subnetConfiguration",
                format!("group name {:?} must be non-empty and alphanumeric", group.name),
            ));
        }
        if groups[..i].iter().any(|g| g.name == group.name) {
            return Err(StackError::invalid_property(
                id,
                "subnetConfiguration",
                format!("group name {:?} is used twice", group.name),
            ));
        }
    }
    Ok(())
}

/// Subnet ranges per group, one per zone
fn allocate_subnets(
    id: &str,
    cidr: Ipv4Cidr,
    zones: usize,
    groups: &[SubnetConfiguration],
) -> Result<Vec<Vec<Ipv4Cidr>>> {
    let exceeded = || {
        StackError::invalid_property(
            id,
            "subnetConfiguration",
            "subnet masks exceed the VPC range",
        )
    };
    let zone_count = u64::try_from(zones).ok().ok_or_else(exceeded)?;
    let mut reserved: u64 = 0;
    for mask in groups.iter().filter_map(|g| g.cidr_mask) {
        let block = 1_u64 << (32 - u32::from(mask.min(32)));
        reserved = block
            .checked_mul(zone_count)
            .and_then(|size| reserved.checked_add(size))
            .ok_or_else(exceeded)?;
    }
    let unmasked = groups.iter().filter(|g| g.cidr_mask.is_none()).count();
    let shared_prefix = if unmasked > 0 {
        let available = cidr.size().checked_sub(reserved).ok_or_else(exceeded)?;
        let subnet_count = unmasked.checked_mul(zones).ok_or_else(exceeded)?;
        Some(equal_share_prefix(available, subnet_count)?.max(cidr.prefix()))
    } else {
        None
    };

    let mut allocator = CidrAllocator::new(cidr);
    groups
        .iter()
        .map(|group| {
            let prefix = group.cidr_mask.or(shared_prefix).ok_or_else(|| {
                StackError::invalid_property(
                    id,
                    "subnetConfiguration",
                    "no prefix for subnet group",
                )
            })?;
            (0..zones).map(|_| allocator.allocate(prefix)).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::StackProps;

    fn builder() -> StackBuilder {
        StackBuilder::new("TestStack", StackProps::default()).unwrap()
    }

    #[test]
    fn test_default_vpc_layout() {
        let mut b = builder();
        let vpc = Vpc::new(&mut b, "VPC", VpcProps::default()).unwrap();

        let cidrs: Vec<String> = vpc.subnets().iter().map(|s| s.cidr().to_string()).collect();
        assert_eq!(
            cidrs,
            vec!["10.0.0.0/18", "10.0.64.0/18", "10.0.128.0/18", "10.0.192.0/18"]
        );
        assert_eq!(vpc.nat_gateways().len(), 2);

        let graph = b.build();
        assert_eq!(graph.resources_of_type("AWS::EC2::Subnet").len(), 4);
        assert_eq!(graph.resources_of_type("AWS::EC2::NatGateway").len(), 2);
        assert_eq!(graph.resources_of_type("AWS::EC2::InternetGateway").len(), 1);
        assert_eq!(graph.resources_of_type("AWS::EC2::Route").len(), 4);
    }

    #[test]
    fn test_private_routes_through_nat() {
        let mut b = builder();
        Vpc::new(&mut b, "VPC", VpcProps::default()).unwrap();
        let graph = b.build();

        let route = graph.resource_at("VPC/PrivateSubnet2/DefaultRoute").unwrap();
        let nat = graph.resource_at("VPC/PublicSubnet2/NATGateway").unwrap();
        assert_eq!(
            route.property("NatGatewayId").unwrap(),
            &serde_json::json!({ "Ref": nat.logical_id().as_str() })
        );

        let public_route = graph.resource_at("VPC/PublicSubnet1/DefaultRoute").unwrap();
        let attachment = graph.resource_at("VPC/VPCGW").unwrap();
        assert_eq!(public_route.depends_on(), &[attachment.logical_id().clone()]);
    }

    #[test]
    fn test_single_nat_gateway_shared() {
        let mut b = builder();
        let props = VpcProps {
            nat_gateways: Some(1),
            ..VpcProps::default()
        };
        let vpc = Vpc::new(&mut b, "VPC", props).unwrap();
        assert_eq!(vpc.nat_gateways().len(), 1);
        assert!(b.build().resource_at("VPC/PublicSubnet2/NATGateway").is_none());
    }

    #[test]
    fn test_private_with_egress_requires_public() {
        let mut b = builder();
        let props = VpcProps {
            subnet_configuration: vec![SubnetConfiguration::new(
                "Private",
                SubnetType::PrivateWithEgress,
            )],
            ..VpcProps::default()
        };
        assert!(matches!(
            Vpc::new(&mut b, "VPC", props),
            Err(StackError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn test_isolated_only_vpc_has_no_gateways() {
        let mut b = builder();
        let props = VpcProps {
            subnet_configuration: vec![SubnetConfiguration::new(
                "Isolated",
                SubnetType::PrivateIsolated,
            )],
            ..VpcProps::default()
        };
        let vpc = Vpc::new(&mut b, "VPC", props).unwrap();
        assert_eq!(vpc.subnets()[0].cidr().to_string(), "10.0.0.0/17");
        let graph = b.build();
        assert!(graph.resources_of_type("AWS::EC2::InternetGateway").is_empty());
        assert!(graph.resources_of_type("AWS::EC2::Route").is_empty());
    }

    #[test]
    fn test_fixed_masks_come_first_in_order() {
        let mut b = builder();
        let props = VpcProps {
            subnet_configuration: vec![
                SubnetConfiguration {
                    cidr_mask: Some(24),
                    ..SubnetConfiguration::new("Public", SubnetType::Public)
                },
                SubnetConfiguration::new("Private", SubnetType::PrivateWithEgress),
            ],
            ..VpcProps::default()
        };
        let vpc = Vpc::new(&mut b, "VPC", props).unwrap();
        let cidrs: Vec<String> = vpc.subnets().iter().map(|s| s.cidr().to_string()).collect();
        assert_eq!(cidrs[0], "10.0.0.0/24");
        assert_eq!(cidrs[1], "10.0.1.0/24");
        assert_eq!(cidrs[2], "10.0.64.0/18");
    }

    #[test]
    fn test_select_subnets() {
        let mut b = builder();
        let vpc = Vpc::new(&mut b, "VPC", VpcProps::default()).unwrap();

        let default = vpc.select_subnets(&SubnetSelection::default()).unwrap();
        assert_eq!(default.subnet_type, SubnetType::PrivateWithEgress);
        assert_eq!(default.subnet_ids.len(), 2);

        let public = vpc.select_subnets(&SubnetSelection::of_group("Public")).unwrap();
        assert_eq!(public.subnet_type, SubnetType::Public);

        assert!(vpc
            .select_subnets(&SubnetSelection::of_type(SubnetType::PrivateIsolated))
            .is_err());
    }

    #[test]
    fn test_private_group_declared_before_public() {
        let mut b = builder();
        let props = VpcProps {
            subnet_configuration: vec![
                SubnetConfiguration::new("Private", SubnetType::PrivateWithEgress),
                SubnetConfiguration::new("Public", SubnetType::Public),
            ],
            ..VpcProps::default()
        };
        let vpc = Vpc::new(&mut b, "VPC", props).unwrap();
        assert_eq!(vpc.nat_gateways().len(), 2);

        let private: Vec<String> = vpc
            .subnets()
            .iter()
            .filter(|s| s.subnet_type() == SubnetType::PrivateWithEgress)
            .map(|s| s.cidr().to_string())
            .collect();
        assert_eq!(private, vec!["10.0.0.0/18", "10.0.64.0/18"]);

        let graph = b.build();
        let route = graph.resource_at("VPC/PrivateSubnet1/DefaultRoute").unwrap();
        let nat = graph.resource_at("VPC/PublicSubnet1/NATGateway").unwrap();
        assert_eq!(
            route.property("NatGatewayId").unwrap(),
            &serde_json::json!({ "Ref": nat.logical_id().as_str() })
        );
    }

    #[test]
    fn test_huge_zone_count_is_rejected() {
        let mut b = builder();
        let props = VpcProps {
            max_azs: usize::MAX,
            subnet_configuration: vec![SubnetConfiguration {
                cidr_mask: Some(24),
                ..SubnetConfiguration::new("Public", SubnetType::Public)
            }],
            ..VpcProps::default()
        };
        assert!(matches!(
            Vpc::new(&mut b, "VPC", props),
            Err(StackError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn test_rejects_oversized_range() {
        let mut b = builder();
        let props = VpcProps {
            cidr: "10.0.0.0/8".to_string(),
            ..VpcProps::default()
        };
        assert!(Vpc::new(&mut b, "VPC", props).is_err());
    }
}
