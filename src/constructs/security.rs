//! # Security Groups and Connections
//!
//! Traffic-control groups and the rule helpers that open ports between
//! them. Every rule is registered as its own ingress/egress resource, so a
//! group is never modified after it has been declared.

use crate::constructs::network::Vpc;
use crate::error::Result;
use crate::graph::{Expr, ResourceRef, StackBuilder};
use crate::resources::ec2::{
    CfnSecurityGroup, CfnSecurityGroupEgress, CfnSecurityGroupIngress, SecurityGroupRule,
};
use crate::resources::Tag;
use tracing::{debug, warn};

const ANY_IPV4: &str = "0.0.0.0/0";

/// Transport protocol of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    /// Every protocol (`-1`)
    All,
}

impl Protocol {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::All => "-1",
        }
    }
}

/// Port range a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    protocol: Protocol,
    from: Option<Expr>,
    to: Option<Expr>,
    label: String,
}

impl Port {
    #[must_use]
    pub fn tcp(port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            from: Some(Expr::Number(i64::from(port))),
            to: Some(Expr::Number(i64::from(port))),
            label: port.to_string(),
        }
    }

    #[must_use]
    pub fn all_tcp() -> Self {
        Self {
            protocol: Protocol::Tcp,
            from: Some(Expr::Number(0)),
            to: Some(Expr::Number(65535)),
            label: "ALL PORTS".to_string(),
        }
    }

    #[must_use]
    pub fn all_traffic() -> Self {
        Self {
            protocol: Protocol::All,
            from: None,
            to: None,
            label: "ALL TRAFFIC".to_string(),
        }
    }

    /// TCP port only known after apply, e.g. a database endpoint port
    #[must_use]
    pub fn tcp_deferred(port: Expr) -> Self {
        Self {
            protocol: Protocol::Tcp,
            from: Some(port.clone()),
            to: Some(port),
            label: "{IndirectPort}".to_string(),
        }
    }

    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Human-readable range used in rule descriptions
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    // Standalone rules always carry a port range
    fn bounds(&self) -> (Expr, Expr) {
        (
            self.from.clone().unwrap_or(Expr::Number(-1)),
            self.to.clone().unwrap_or(Expr::Number(-1)),
        )
    }
}

/// Source of inbound traffic
#[derive(Debug, Clone)]
pub enum Peer {
    AnyIpv4,
    Ipv4(String),
    SecurityGroup(SecurityGroup),
}

impl Peer {
    fn unique_id(&self) -> String {
        match self {
            Peer::AnyIpv4 => ANY_IPV4.to_string(),
            Peer::Ipv4(cidr) => cidr.clone(),
            Peer::SecurityGroup(group) => group.resource.logical_id().to_string(),
        }
    }
}

/// Options for a new security group
#[derive(Debug, Clone)]
pub struct SecurityGroupProps<'a> {
    pub vpc: &'a Vpc,
    /// Physical group name; generated by the provider when unset
    pub security_group_name: Option<String>,
    pub description: Option<String>,
    pub allow_all_outbound: bool,
}

impl<'a> SecurityGroupProps<'a> {
    #[must_use]
    pub fn new(vpc: &'a Vpc) -> Self {
        Self {
            vpc,
            security_group_name: None,
            description: None,
            allow_all_outbound: true,
        }
    }
}

/// Declared security group
#[derive(Debug, Clone)]
pub struct SecurityGroup {
    resource: ResourceRef,
    path: String,
    allow_all_outbound: bool,
}

impl SecurityGroup {
    pub fn new(
        builder: &mut StackBuilder,
        id: &str,
        props: SecurityGroupProps<'_>,
    ) -> Result<Self> {
        let path = id.to_string();
        let description = props
            .description
            .unwrap_or_else(|| format!("{}/{id}", builder.stack_name()));

        let egress = if props.allow_all_outbound {
            vec![SecurityGroupRule {
                cidr_ip: Some(ANY_IPV4.to_string()),
                description: Some("Allow all outbound traffic by default".to_string()),
                from_port: None,
                ip_protocol: Protocol::All.as_str().to_string(),
                to_port: None,
            }]
        } else {
            // A group without rules would allow everything out; pin it shut
            vec![SecurityGroupRule {
                cidr_ip: Some("255.255.255.255/32".to_string()),
                description: Some("Disallow all traffic".to_string()),
                from_port: Some(Expr::Number(252)),
                ip_protocol: "icmp".to_string(),
                to_port: Some(Expr::Number(86)),
            }]
        };

        let resource = builder.add(
            &format!("{path}/Resource"),
            CfnSecurityGroup {
                group_description: description,
                group_name: props.security_group_name,
                security_group_egress: egress,
                security_group_ingress: Vec::new(),
                vpc_id: props.vpc.vpc_id(),
                tags: Vec::<Tag>::new(),
            },
        )?;

        Ok(Self {
            resource,
            path,
            allow_all_outbound: props.allow_all_outbound,
        })
    }

    #[must_use]
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn allows_all_outbound(&self) -> bool {
        self.allow_all_outbound
    }

    #[must_use]
    pub fn group_id(&self) -> Expr {
        self.resource.attr("GroupId")
    }

    /// Accept traffic from `peer` on `port`
    ///
    /// Adding the same peer and port twice returns the rule declared first.
    pub fn add_ingress_rule(
        &self,
        builder: &mut StackBuilder,
        peer: &Peer,
        port: &Port,
    ) -> Result<ResourceRef> {
        let description = format!("from {}:{}", peer.unique_id(), port.label());
        let path = format!("{}/{description}", self.path);
        if let Some(existing) = builder.resource_at(&path) {
            debug!(group = %self.path, rule = %description, "Ingress rule already declared");
            return Ok(existing);
        }
        let (from_port, to_port) = port.bounds();
        let (cidr_ip, source_security_group_id) = match peer {
            Peer::AnyIpv4 => (Some(ANY_IPV4.to_string()), None),
            Peer::Ipv4(cidr) => (Some(cidr.clone()), None),
            Peer::SecurityGroup(group) => (None, Some(group.group_id())),
        };

        if cidr_ip.as_deref() == Some(ANY_IPV4) {
            warn!(
                group = %self.path,
                rule = %description,
                "Ingress open to the whole IPv4 internet"
            );
        }
        debug!(group = %self.path, rule = %description, "Adding ingress rule");
        builder.add(
            &path,
            CfnSecurityGroupIngress {
                ip_protocol: port.protocol().as_str().to_string(),
                cidr_ip,
                description,
                from_port,
                group_id: self.group_id(),
                source_security_group_id,
                to_port,
            },
        )
    }

    /// Allow traffic to `peer` on `port`; a no-op when all outbound is already allowed
    pub fn add_egress_rule(
        &self,
        builder: &mut StackBuilder,
        peer: &SecurityGroup,
        port: &Port,
    ) -> Result<Option<ResourceRef>> {
        if self.allow_all_outbound {
            return Ok(None);
        }
        let description = format!("to {}:{}", peer.resource.logical_id(), port.label());
        let path = format!("{}/{description}", self.path);
        if let Some(existing) = builder.resource_at(&path) {
            debug!(group = %self.path, rule = %description, "Egress rule already declared");
            return Ok(Some(existing));
        }
        let (from_port, to_port) = port.bounds();

        debug!(group = %self.path, rule = %description, "Adding egress rule");
        builder
            .add(
                &path,
                CfnSecurityGroupEgress {
                    ip_protocol: port.protocol().as_str().to_string(),
                    description,
                    destination_security_group_id: Some(peer.group_id()),
                    from_port,
                    group_id: self.group_id(),
                    to_port,
                },
            )
            .map(Some)
    }
}

/// Network identity of a resource: its groups and the port it listens on
#[derive(Debug, Clone)]
pub struct Connections {
    security_groups: Vec<SecurityGroup>,
    default_port: Option<Port>,
}

impl Connections {
    #[must_use]
    pub fn new(security_groups: Vec<SecurityGroup>, default_port: Option<Port>) -> Self {
        Self {
            security_groups,
            default_port,
        }
    }

    #[must_use]
    pub fn security_groups(&self) -> &[SecurityGroup] {
        &self.security_groups
    }

    #[must_use]
    pub fn default_port(&self) -> Option<&Port> {
        self.default_port.as_ref()
    }

    /// Open `port` on every group to the whole IPv4 internet
    pub fn allow_from_any_ipv4(
        &self,
        builder: &mut StackBuilder,
        port: &Port,
    ) -> Result<Vec<ResourceRef>> {
        self.security_groups
            .iter()
            .map(|group| group.add_ingress_rule(builder, &Peer::AnyIpv4, port))
            .collect()
    }

    /// Open `port` from every group of `other`, adding matching egress on
    /// `other` where its groups restrict outbound traffic
    pub fn allow_from(
        &self,
        builder: &mut StackBuilder,
        other: &impl Connectable,
        port: &Port,
    ) -> Result<Vec<ResourceRef>> {
        let mut rules = Vec::new();
        for source in other.connections().security_groups() {
            for target in &self.security_groups {
                rules.push(target.add_ingress_rule(
                    builder,
                    &Peer::SecurityGroup(source.clone()),
                    port,
                )?);
                if let Some(egress) = source.add_egress_rule(builder, target, port)? {
                    rules.push(egress);
                }
            }
        }
        Ok(rules)
    }

    /// [`allow_from`](Self::allow_from) on the default port
    pub fn allow_default_port_from(
        &self,
        builder: &mut StackBuilder,
        other: &impl Connectable,
    ) -> Result<Vec<ResourceRef>> {
        let port = self.default_port.clone().ok_or_else(|| {
            crate::error::StackError::invalid_property(
                "Connections",
                "defaultPort",
                "no default port to open",
            )
        })?;
        self.allow_from(builder, other, &port)
    }
}

/// Something that owns a [`Connections`]
pub trait Connectable {
    fn connections(&self) -> &Connections;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructs::network::VpcProps;
    use crate::stack::StackProps;

    struct Client {
        connections: Connections,
    }

    impl Connectable for Client {
        fn connections(&self) -> &Connections {
            &self.connections
        }
    }

    fn setup() -> (StackBuilder, Vpc) {
        let mut builder = StackBuilder::new("TestStack", StackProps::default()).unwrap();
        let vpc = Vpc::new(&mut builder, "VPC", VpcProps::default()).unwrap();
        (builder, vpc)
    }

    #[test]
    fn test_default_egress_allows_everything() {
        let (mut builder, vpc) = setup();
        let group =
            SecurityGroup::new(&mut builder, "Group", SecurityGroupProps::new(&vpc)).unwrap();
        assert!(group.allows_all_outbound());

        let graph = builder.build();
        let rendered = graph.resource_at("Group/Resource").unwrap();
        assert_eq!(
            rendered.property("GroupDescription").unwrap(),
            &serde_json::json!("TestStack/Group")
        );
        assert_eq!(
            rendered.property("SecurityGroupEgress").unwrap()[0]["IpProtocol"],
            serde_json::json!("-1")
        );
    }

    #[test]
    fn test_restricted_group_gets_egress_rules() {
        let (mut builder, vpc) = setup();
        let target = SecurityGroup::new(&mut builder, "Db", SecurityGroupProps::new(&vpc)).unwrap();
        let source = SecurityGroup::new(
            &mut builder,
            "Client",
            SecurityGroupProps {
                allow_all_outbound: false,
                ..SecurityGroupProps::new(&vpc)
            },
        )
        .unwrap();

        let connections = Connections::new(vec![target], Some(Port::tcp(3306)));
        let client = Client {
            connections: Connections::new(vec![source], None),
        };
        let rules = connections.allow_default_port_from(&mut builder, &client).unwrap();
        assert_eq!(rules.len(), 2);

        let graph = builder.build();
        assert_eq!(graph.resources_of_type("AWS::EC2::SecurityGroupIngress").len(), 1);
        assert_eq!(graph.resources_of_type("AWS::EC2::SecurityGroupEgress").len(), 1);
    }

    #[test]
    fn test_repeated_rule_is_declared_once() {
        let (mut builder, vpc) = setup();
        let target = SecurityGroup::new(&mut builder, "Db", SecurityGroupProps::new(&vpc)).unwrap();
        let source =
            SecurityGroup::new(&mut builder, "Client", SecurityGroupProps::new(&vpc)).unwrap();

        let connections = Connections::new(vec![target], Some(Port::tcp(3306)));
        let client = Client {
            connections: Connections::new(vec![source], None),
        };
        let first = connections.allow_default_port_from(&mut builder, &client).unwrap();
        let second = connections.allow_default_port_from(&mut builder, &client).unwrap();
        assert_eq!(first, second);

        let open = connections.allow_from_any_ipv4(&mut builder, &Port::all_tcp()).unwrap();
        let again = connections.allow_from_any_ipv4(&mut builder, &Port::all_tcp()).unwrap();
        assert_eq!(open, again);

        let graph = builder.build();
        assert_eq!(graph.resources_of_type("AWS::EC2::SecurityGroupIngress").len(), 2);
    }

    #[test]
    fn test_default_port_required() {
        let (mut builder, vpc) = setup();
        let target = SecurityGroup::new(&mut builder, "Db", SecurityGroupProps::new(&vpc)).unwrap();
        let connections = Connections::new(vec![target.clone()], None);
        let client = Client {
            connections: Connections::new(vec![target], None),
        };
        assert!(connections.allow_default_port_from(&mut builder, &client).is_err());
    }
}
