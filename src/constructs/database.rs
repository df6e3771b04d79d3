//! # Database Instance
//!
//! A relational database placed in selected VPC subnets, with a generated
//! admin secret, its own security group and optional IAM authentication.

use crate::constants::{
    DEFAULT_DB_ALLOCATED_STORAGE, DEFAULT_DB_INSTANCE_CLASS, GENERATED_PASSWORD_LENGTH,
    PASSWORD_EXCLUDE_CHARACTERS,
};
use crate::constructs::network::{SubnetSelection, SubnetType, Vpc};
use crate::constructs::security::{
    Connectable, Connections, Port, SecurityGroup, SecurityGroupProps,
};
use crate::error::{Result, StackError};
use crate::graph::{Expr, RemovalPolicy, ResourceOptions, ResourceRef, StackBuilder};
use crate::resources::iam::{CfnPolicy, PolicyDocument, Statement};
use crate::resources::rds::{CfnDbInstance, CfnDbSubnetGroup};
use crate::resources::secretsmanager::{CfnSecret, CfnSecretTargetAttachment, GenerateSecretString};
use crate::resources::Tag;
use cfn_arns::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static DB_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,63}$").expect("Failed to compile database name regex")
});

static DB_USER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,31}$").expect("Failed to compile database user regex")
});

/// Database engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    MySql,
    MariaDb,
    Postgres,
}

impl Engine {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::MySql => "mysql",
            Engine::MariaDb => "mariadb",
            Engine::Postgres => "postgres",
        }
    }

    /// Human-readable name used in descriptions
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Engine::MySql => "MySql",
            Engine::MariaDb => "MariaDb",
            Engine::Postgres => "Postgres",
        }
    }

    #[must_use]
    pub fn default_port(&self) -> u16 {
        match self {
            Engine::MySql | Engine::MariaDb => 3306,
            Engine::Postgres => 5432,
        }
    }

    /// Whether the engine accepts IAM-issued authentication tokens
    #[must_use]
    pub fn supports_iam_authentication(&self) -> bool {
        !matches!(self, Engine::MariaDb)
    }
}

/// Admin login, with the password generated into a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
}

impl Credentials {
    #[must_use]
    pub fn from_generated_secret(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseInstanceProps<'a> {
    pub engine: Engine,
    pub engine_version: Option<String>,
    pub vpc: &'a Vpc,
    pub vpc_subnets: SubnetSelection,
    pub credentials: Credentials,
    pub database_name: Option<String>,
    pub iam_authentication: bool,
    pub instance_class: String,
    pub allocated_storage: String,
    pub storage_type: String,
    pub multi_az: Option<bool>,
    pub backup_retention_days: Option<u32>,
    pub delete_automated_backups: bool,
    pub removal_policy: RemovalPolicy,
    /// Defaults to whether the selected subnets are public
    pub publicly_accessible: Option<bool>,
}

impl<'a> DatabaseInstanceProps<'a> {
    #[must_use]
    pub fn new(engine: Engine, vpc: &'a Vpc, credentials: Credentials) -> Self {
        Self {
            engine,
            engine_version: None,
            vpc,
            vpc_subnets: SubnetSelection::default(),
            credentials,
            database_name: None,
            iam_authentication: false,
            instance_class: DEFAULT_DB_INSTANCE_CLASS.to_string(),
            allocated_storage: DEFAULT_DB_ALLOCATED_STORAGE.to_string(),
            storage_type: "gp2".to_string(),
            multi_az: None,
            backup_retention_days: None,
            delete_automated_backups: true,
            removal_policy: RemovalPolicy::Snapshot,
            publicly_accessible: None,
        }
    }
}

/// Principal that can receive IAM grants
pub trait Grantable {
    /// The role statements are attached to
    fn grant_role(&self) -> &ResourceRef;

    /// Construct path grant policies are declared under
    fn grant_path(&self) -> &str;
}

/// Declared database instance
#[derive(Debug, Clone)]
pub struct DatabaseInstance {
    resource: ResourceRef,
    secret: ResourceRef,
    path: String,
    engine: Engine,
    database_name: Option<String>,
    iam_authentication: bool,
    connections: Connections,
}

impl DatabaseInstance {
    pub fn new(
        builder: &mut StackBuilder,
        id: &str,
        props: DatabaseInstanceProps<'_>,
    ) -> Result<Self> {
        validate(id, &props)?;

        let selected = props.vpc.select_subnets(&props.vpc_subnets)?;
        let publicly_accessible = props
            .publicly_accessible
            .unwrap_or(selected.subnet_type == SubnetType::Public);
        let engine_name = props.engine.display_name();

        let subnet_group = builder.add_with(
            &format!("{id}/SubnetGroup/Default"),
            CfnDbSubnetGroup {
                description: format!("Subnet group for {engine_name} database"),
                subnet_ids: selected.subnet_ids,
                tags: Vec::new(),
            },
            ResourceOptions::default().removal_policy(props.removal_policy),
        )?;

        let security_group = SecurityGroup::new(
            builder,
            &format!("{id}/SecurityGroup"),
            SecurityGroupProps {
                description: Some(format!("Security group for {engine_name} database")),
                ..SecurityGroupProps::new(props.vpc)
            },
        )?;

        let secret_description =
            format!("Generated by the stack for: {}/{id}", builder.stack_name());
        let secret = builder.add_with(
            &format!("{id}/Secret/Resource"),
            CfnSecret {
                description: Some(secret_description),
                generate_secret_string: GenerateSecretString {
                    exclude_characters: PASSWORD_EXCLUDE_CHARACTERS.to_string(),
                    generate_string_key: "password".to_string(),
                    password_length: GENERATED_PASSWORD_LENGTH,
                    secret_string_template: serde_json::json!({
                        "username": props.credentials.username()
                    })
                    .to_string(),
                },
                tags: Vec::<Tag>::new(),
            },
            ResourceOptions::default().removal_policy(RemovalPolicy::Destroy),
        )?;

        let resource = builder.add_with(
            &format!("{id}/Resource"),
            CfnDbInstance {
                allocated_storage: props.allocated_storage,
                backup_retention_period: props.backup_retention_days,
                copy_tags_to_snapshot: true,
                db_instance_class: props.instance_class,
                db_name: props.database_name.clone(),
                db_subnet_group_name: subnet_group.reference(),
                delete_automated_backups: props.delete_automated_backups,
                enable_iam_database_authentication: props.iam_authentication,
                engine: props.engine.as_str().to_string(),
                engine_version: props.engine_version,
                master_user_password: secret_field(&secret, "password"),
                master_username: secret_field(&secret, "username"),
                multi_az: props.multi_az,
                publicly_accessible,
                storage_type: props.storage_type,
                vpc_security_groups: vec![security_group.group_id()],
                tags: Vec::new(),
            },
            ResourceOptions::default().removal_policy(props.removal_policy),
        )?;

        builder.add(
            &format!("{id}/Secret/Attachment/Resource"),
            CfnSecretTargetAttachment {
                secret_id: secret.reference(),
                target_id: resource.reference(),
                target_type: "AWS::RDS::DBInstance".to_string(),
            },
        )?;

        info!(
            database = id,
            engine = props.engine.as_str(),
            iam_authentication = props.iam_authentication,
            publicly_accessible,
            "Declared database instance"
        );

        let default_port = Port::tcp_deferred(resource.attr("Endpoint.Port"));
        Ok(Self {
            resource,
            secret,
            path: id.to_string(),
            engine: props.engine,
            database_name: props.database_name,
            iam_authentication: props.iam_authentication,
            connections: Connections::new(vec![security_group], Some(default_port)),
        })
    }

    #[must_use]
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    #[must_use]
    pub fn engine(&self) -> Engine {
        self.engine
    }

    #[must_use]
    pub fn database_name(&self) -> Option<&str> {
        self.database_name.as_deref()
    }

    /// Hostname, known only after apply
    #[must_use]
    pub fn endpoint_address(&self) -> Expr {
        self.resource.attr("Endpoint.Address")
    }

    /// Port, known only after apply
    #[must_use]
    pub fn endpoint_port(&self) -> Expr {
        self.resource.attr("Endpoint.Port")
    }

    #[must_use]
    pub fn instance_resource_id(&self) -> Expr {
        self.resource.attr("DbiResourceId")
    }

    #[must_use]
    pub fn secret_arn(&self) -> Expr {
        self.secret.reference()
    }

    /// ARN a `rds-db:connect` grant for `db_user` applies to
    pub fn connect_arn(&self, db_user: &str) -> Result<Expr> {
        let parts = ArnBuilder::new()
            .service(Service::RdsDb)
            .resource_type("dbuser")
            .resource_token("DbiResourceId")
            .resource_suffix(format!("/{db_user}"))
            .build_parts()?;
        Expr::from_arn_parts(parts, &[("DbiResourceId", self.instance_resource_id())])
    }

    /// Let `grantee` open IAM-authenticated sessions as database user `db_user`
    ///
    /// The user must exist inside the database; creating it is a manual
    /// step (see `bootstrap-sql`).
    pub fn grant_connect(
        &self,
        builder: &mut StackBuilder,
        grantee: &impl Grantable,
        db_user: &str,
    ) -> Result<ResourceRef> {
        if !self.iam_authentication {
            return Err(StackError::invalid_property(
                &self.path,
                "iamAuthentication",
                "connect grants need IAM authentication enabled",
            ));
        }
        if !DB_USER_PATTERN.is_match(db_user) {
            return Err(StackError::invalid_property(
                &self.path,
                "dbUser",
                format!("{db_user:?} is not a valid database user name"),
            ));
        }

        let path = format!("{}/{}ConnectPolicy", grantee.grant_path(), self.path);
        let policy_name = builder.logical_id(&path).to_string();
        debug!(grantee = grantee.grant_path(), db_user, "Granting rds-db:connect");

        builder.add(
            &path,
            CfnPolicy {
                policy_document: PolicyDocument::new(vec![Statement::allow(
                    &["rds-db:connect"],
                    self.connect_arn(db_user)?,
                )]),
                policy_name,
                roles: vec![grantee.grant_role().reference()],
            },
        )
    }
}

impl Connectable for DatabaseInstance {
    fn connections(&self) -> &Connections {
        &self.connections
    }
}

fn secret_field(secret: &ResourceRef, field: &str) -> Expr {
    Expr::concat(vec![
        Expr::from("{{resolve:secretsmanager:"),
        secret.reference(),
        Expr::Literal(format!(":SecretString:{field}::}}}}")),
    ])
}

fn validate(id: &str, props: &DatabaseInstanceProps<'_>) -> Result<()> {
    if let Some(name) = &props.database_name {
        if !DB_NAME_PATTERN.is_match(name) {
            return Err(StackError::invalid_property(
                id,
                "databaseName",
                format!(
                    "{name:?} must start with a letter and contain only letters, digits \
                     and underscores"
                ),
            ));
        }
    }
    if !DB_USER_PATTERN.is_match(props.credentials.username()) {
        return Err(StackError::invalid_property(
            id,
            "credentials",
            format!("{:?} is not a valid admin user name", props.credentials.username()),
        ));
    }
    if props.iam_authentication && !props.engine.supports_iam_authentication() {
        return Err(StackError::invalid_property(
            id,
            "iamAuthentication",
            format!("{} does not support IAM authentication", props.engine.as_str()),
        ));
    }
    match props.allocated_storage.parse::<u32>() {
        Ok(gib) if (20..=65536).contains(&gib) => Ok(()),
        _ => Err(StackError::invalid_property(
            id,
            "allocatedStorage",
            format!(
                "{:?} must be a whole number of GiB between 20 and 65536",
                props.allocated_storage
            ),
        )),
    }
}
