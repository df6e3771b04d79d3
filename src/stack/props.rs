//! # Stack Properties
//!
//! Deployment-wide properties accepted by `define`, loadable from YAML/JSON.

use crate::error::{Result, StackError};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static STACK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("Failed to compile stack name regex")
});

static ACCOUNT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{12}$").expect("Failed to compile account regex"));

static REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-\d+$").expect("Failed to compile region regex")
});

const MAX_STACK_NAME_LEN: usize = 128;
const MAX_TAG_KEY_LEN: usize = 128;
const MAX_TAG_VALUE_LEN: usize = 256;
const MAX_DESCRIPTION_LEN: usize = 1024;

/// Target account and region
///
/// Either may be left unset, in which case the template stays
/// environment-agnostic and the provisioning engine fills them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Deployment-wide stack properties
///
/// # Example
///
/// ```yaml
/// env:
///   account: "123456789012"
///   region: eu-west-1
/// tags:
///   team: platform
/// description: Lambda with IAM access to MySQL
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StackProps {
    /// Target environment (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Environment>,
    /// Tags applied to every taggable resource
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Template description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StackProps {
    /// Reject malformed properties before anything is declared
    pub fn validate(&self) -> Result<()> {
        if let Some(env) = &self.env {
            if let Some(account) = &env.account {
                if !ACCOUNT_ID.is_match(account) {
                    return Err(StackError::InvalidEnvironment(format!(
                        "account {account:?} must be 12 digits"
                    )));
                }
            }
            if let Some(region) = &env.region {
                if !REGION.is_match(region) {
                    return Err(StackError::InvalidEnvironment(format!(
                        "region {region:?} is not a region name"
                    )));
                }
            }
        }

        for (key, value) in &self.tags {
            let reason = if key.is_empty() {
                Some("key must not be empty".to_string())
            } else if key.len() > MAX_TAG_KEY_LEN {
                Some(format!("key longer than {MAX_TAG_KEY_LEN} characters"))
            } else if key.to_ascii_lowercase().starts_with("aws:") {
                Some("the aws: prefix is reserved".to_string())
            } else if value.len() > MAX_TAG_VALUE_LEN {
                Some(format!("value longer than {MAX_TAG_VALUE_LEN} characters"))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(StackError::InvalidTag {
                    key: key.clone(),
                    reason,
                });
            }
        }

        if let Some(description) = &self.description {
            if description.len() > MAX_DESCRIPTION_LEN {
                return Err(StackError::invalid_property(
                    "Stack",
                    "description",
                    format!("longer than {MAX_DESCRIPTION_LEN} characters"),
                ));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.env.as_ref().and_then(|e| e.account.as_deref())
    }

    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.env.as_ref().and_then(|e| e.region.as_deref())
    }
}

/// Stack names follow the provider's naming rules
pub fn validate_stack_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.len() > MAX_STACK_NAME_LEN {
        "must be at most 128 characters"
    } else if !STACK_NAME.is_match(name) {
        "must start with a letter and contain only letters, digits and hyphens"
    } else {
        return Ok(());
    };

    Err(StackError::InvalidStackName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env(account: Option<&str>, region: Option<&str>) -> StackProps {
        StackProps {
            env: Some(Environment {
                account: account.map(str::to_string),
                region: region.map(str::to_string),
            }),
            ..StackProps::default()
        }
    }

    #[test]
    fn test_stack_names() {
        assert!(validate_stack_name("LambdaRDSStack").is_ok());
        assert!(validate_stack_name("dev-stack-2").is_ok());
        assert!(validate_stack_name("").is_err());
        assert!(validate_stack_name("2fast").is_err());
        assert!(validate_stack_name("has_underscore").is_err());
        assert!(validate_stack_name(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_environment_validation() {
        assert!(with_env(Some("123456789012"), Some("eu-west-1")).validate().is_ok());
        assert!(with_env(None, Some("us-gov-west-1")).validate().is_ok());
        assert!(with_env(Some("12345"), None).validate().is_err());
        assert!(with_env(None, Some("Europe")).validate().is_err());
    }

    #[test]
    fn test_tag_validation() {
        let mut props = StackProps::default();
        props.tags.insert("team".into(), "platform".into());
        assert!(props.validate().is_ok());

        props.tags.insert("aws:createdBy".into(), "me".into());
        assert!(matches!(props.validate(), Err(StackError::InvalidTag { .. })));

        let mut props = StackProps::default();
        props.tags.insert(String::new(), "x".into());
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_props_from_yaml() {
        let yaml = r#"
env:
  account: "123456789012"
  region: eu-west-1
tags:
  team: platform
"#;
        let props: StackProps = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(props.account(), Some("123456789012"));
        assert_eq!(props.region(), Some("eu-west-1"));
        assert_eq!(props.tags.get("team").map(String::as_str), Some("platform"));
        assert!(props.description.is_none());
    }
}
