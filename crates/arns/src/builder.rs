//! ArnBuilder implementation
//!
//! Provides a type-safe builder pattern for constructing ARNs with
//! different output formats for different consumers.

use crate::errors::ArnBuilderError;
use crate::formats::{ArnFormat, ArnPart, ArnRendering};
use crate::service::Service;

/// Value of one ARN segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Known at definition time
    Literal(String),
    /// Taken from the deploying stack (partition, region or account)
    Current,
    /// Placeholder resolved by the caller, e.g. another resource's attribute
    Token(String),
}

/// Builder for constructing ARNs with type safety
///
/// # Example
///
/// ```rust
/// use cfn_arns::prelude::*;
///
/// let arn = ArnBuilder::new()
///     .service(Service::Iam)
///     .account("aws")
///     .resource_type("policy")
///     .resource("service-role/AWSLambdaVPCAccessExecutionRole")
///     .build(ArnFormat::Sub);
/// // Returns: "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole"
/// ```
#[derive(Debug, Clone)]
pub struct ArnBuilder {
    partition: Segment,
    service: Option<Service>,
    region: Option<Segment>,
    account: Segment,
    resource_type: Option<String>,
    resource: Option<Segment>,
    resource_suffix: Option<String>,
}

impl Default for ArnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArnBuilder {
    /// Create a new ArnBuilder scoped to the deploying stack's partition and account
    #[must_use]
    pub fn new() -> Self {
        Self {
            partition: Segment::Current,
            service: None,
            region: None,
            account: Segment::Current,
            resource_type: None,
            resource: None,
            resource_suffix: None,
        }
    }

    #[must_use]
    pub fn service(mut self, service: Service) -> Self {
        self.service = Some(service);
        self
    }

    #[must_use]
    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Segment::Literal(partition.into());
        self
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(Segment::Literal(region.into()));
        self
    }

    /// Use the deploying stack's region (the default for regional services)
    #[must_use]
    pub fn current_region(mut self) -> Self {
        self.region = Some(Segment::Current);
        self
    }

    #[must_use]
    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Segment::Literal(account.into());
        self
    }

    #[must_use]
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    #[must_use]
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(Segment::Literal(resource.into()));
        self
    }

    /// Resource id that is only known at deploy time
    #[must_use]
    pub fn resource_token(mut self, token: impl Into<String>) -> Self {
        self.resource = Some(Segment::Token(token.into()));
        self
    }

    /// Literal text appended after the resource id, e.g. `/username`
    #[must_use]
    pub fn resource_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.resource_suffix = Some(suffix.into());
        self
    }

    // Build methods
    pub fn build_parts(&self) -> Result<Vec<ArnPart>, ArnBuilderError> {
        match self.build(ArnFormat::Parts)? {
            ArnRendering::Parts(parts) => Ok(parts),
            _ => unreachable!("parts format always renders parts"),
        }
    }

    pub fn build_sub(&self) -> Result<String, ArnBuilderError> {
        match self.build(ArnFormat::Sub)? {
            ArnRendering::Sub(template) => Ok(template),
            _ => unreachable!("sub format always renders a template"),
        }
    }

    pub fn build_literal(&self) -> Result<String, ArnBuilderError> {
        match self.build(ArnFormat::Literal)? {
            ArnRendering::Literal(arn) => Ok(arn),
            _ => unreachable!("literal format always renders a string"),
        }
    }

    // Generic build with format
    pub fn build(&self, format: ArnFormat) -> Result<ArnRendering, ArnBuilderError> {
        let parts = self.assemble()?;

        match format {
            ArnFormat::Parts => Ok(ArnRendering::Parts(parts)),
            ArnFormat::Sub => Ok(ArnRendering::Sub(
                parts.iter().map(render_sub).collect::<String>(),
            )),
            ArnFormat::Literal => {
                let mut arn = String::new();
                for part in &parts {
                    match part {
                        ArnPart::Text(text) => arn.push_str(text),
                        ArnPart::Partition => {
                            return Err(ArnBuilderError::UnresolvedSegment("partition".into()))
                        }
                        ArnPart::Region => {
                            return Err(ArnBuilderError::UnresolvedSegment("region".into()))
                        }
                        ArnPart::Account => {
                            return Err(ArnBuilderError::UnresolvedSegment("account".into()))
                        }
                        ArnPart::Token(token) => {
                            return Err(ArnBuilderError::UnresolvedSegment(token.clone()))
                        }
                    }
                }
                Ok(ArnRendering::Literal(arn))
            }
        }
    }

    fn assemble(&self) -> Result<Vec<ArnPart>, ArnBuilderError> {
        let service = self
            .service
            .ok_or_else(|| ArnBuilderError::MissingRequiredParameter("service".to_string()))?;
        let resource = self
            .resource
            .as_ref()
            .ok_or_else(|| ArnBuilderError::MissingRequiredParameter("resource".to_string()))?;

        // Global services carry an empty region segment
        let region = match (&self.region, service.is_global()) {
            (Some(_), true) => {
                return Err(ArnBuilderError::RegionForGlobalService(
                    service.as_str().to_string(),
                ))
            }
            (None, true) => None,
            (Some(region), false) => Some(region.clone()),
            (None, false) => Some(Segment::Current),
        };

        validate_segment("partition", &self.partition)?;
        validate_segment("account", &self.account)?;
        if let Some(region) = &region {
            validate_segment("region", region)?;
        }

        let mut parts = Vec::new();
        push_text(&mut parts, "arn:");
        push_segment(&mut parts, &self.partition, ArnPart::Partition);
        push_text(&mut parts, &format!(":{}:", service.as_str()));
        if let Some(region) = &region {
            push_segment(&mut parts, region, ArnPart::Region);
        }
        push_text(&mut parts, ":");
        push_segment(&mut parts, &self.account, ArnPart::Account);
        push_text(&mut parts, ":");
        if let Some(resource_type) = &self.resource_type {
            push_text(
                &mut parts,
                &format!("{resource_type}{}", service.resource_separator()),
            );
        }
        match resource {
            Segment::Literal(value) => push_text(&mut parts, value),
            Segment::Token(token) => parts.push(ArnPart::Token(token.clone())),
            Segment::Current => {
                return Err(ArnBuilderError::InvalidSegment {
                    field: "resource".to_string(),
                    value: "<current>".to_string(),
                })
            }
        }
        if let Some(suffix) = &self.resource_suffix {
            push_text(&mut parts, suffix);
        }

        Ok(parts)
    }
}

fn validate_segment(field: &str, segment: &Segment) -> Result<(), ArnBuilderError> {
    match segment {
        Segment::Literal(value) if value.contains(':') => Err(ArnBuilderError::InvalidSegment {
            field: field.to_string(),
            value: value.clone(),
        }),
        Segment::Literal(value) if field == "partition" && value.is_empty() => {
            Err(ArnBuilderError::MissingRequiredParameter(field.to_string()))
        }
        _ => Ok(()),
    }
}

// Merge into the previous text part so joins stay minimal
fn push_text(parts: &mut Vec<ArnPart>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(ArnPart::Text(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(ArnPart::Text(text.to_string()));
    }
}

fn push_segment(parts: &mut Vec<ArnPart>, segment: &Segment, current: ArnPart) {
    match segment {
        Segment::Literal(value) => push_text(parts, value),
        Segment::Current => parts.push(current),
        Segment::Token(token) => parts.push(ArnPart::Token(token.clone())),
    }
}

fn render_sub(part: &ArnPart) -> String {
    match part {
        ArnPart::Text(text) => text.clone(),
        ArnPart::Partition => "${AWS::Partition}".to_string(),
        ArnPart::Region => "${AWS::Region}".to_string(),
        ArnPart::Account => "${AWS::AccountId}".to_string(),
        ArnPart::Token(token) => format!("${{{token}}}"),
    }
}
