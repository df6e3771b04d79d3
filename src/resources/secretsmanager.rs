//! # Secrets Manager Resources

use super::Tag;
use crate::graph::Expr;
use serde::Serialize;

/// Password generation rules for a secret created by the provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenerateSecretString {
    pub exclude_characters: String,
    pub generate_string_key: String,
    pub password_length: u32,
    pub secret_string_template: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSecret {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub generate_secret_string: GenerateSecretString,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}
cfn_resource!(CfnSecret, "AWS::SecretsManager::Secret", tagged);

/// Links a secret to the database it holds credentials for
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSecretTargetAttachment {
    pub secret_id: Expr,
    pub target_id: Expr,
    pub target_type: String,
}
cfn_resource!(
    CfnSecretTargetAttachment,
    "AWS::SecretsManager::SecretTargetAttachment"
);
