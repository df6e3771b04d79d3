//! Service namespaces that appear in ARNs

/// AWS service namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Ec2,
    Iam,
    Lambda,
    Logs,
    Rds,
    /// IAM database authentication (`rds-db:connect`)
    RdsDb,
    S3,
    SecretsManager,
}

impl Service {
    /// Namespace string as it appears in the ARN
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Ec2 => "ec2",
            Service::Iam => "iam",
            Service::Lambda => "lambda",
            Service::Logs => "logs",
            Service::Rds => "rds",
            Service::RdsDb => "rds-db",
            Service::S3 => "s3",
            Service::SecretsManager => "secretsmanager",
        }
    }

    /// Global services leave the region segment empty
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Service::Iam | Service::S3)
    }

    /// Separator placed between the resource type and the resource id
    #[must_use]
    pub fn resource_separator(&self) -> char {
        match self {
            Service::Iam | Service::S3 => '/',
            _ => ':',
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
