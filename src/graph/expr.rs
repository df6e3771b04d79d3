//! # Deferred Values
//!
//! Property values that may only be known once the provisioning engine has
//! created the resources they point at. They serialize to CloudFormation
//! intrinsic functions and are never evaluated locally.

use crate::error::{Result, StackError};
use crate::graph::LogicalId;
use cfn_arns::formats::ArnPart;
use regex::Regex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// `${Name}` or `${Name.Attribute}` inside an `Fn::Sub` template
static SUB_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9:]+)(?:\.[A-Za-z0-9.]+)?\}")
        .expect("Failed to compile Fn::Sub placeholder regex")
});

/// Stack-level pseudo parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pseudo {
    AccountId,
    Partition,
    Region,
    StackName,
    UrlSuffix,
}

impl Pseudo {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::Partition => "AWS::Partition",
            Pseudo::Region => "AWS::Region",
            Pseudo::StackName => "AWS::StackName",
            Pseudo::UrlSuffix => "AWS::URLSuffix",
        }
    }
}

/// A property value, literal or resolved by the provisioning engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Number(i64),
    Bool(bool),
    Ref(LogicalId),
    GetAtt { target: LogicalId, attribute: String },
    Pseudo(Pseudo),
    Join { delimiter: String, parts: Vec<Expr> },
    Select { index: usize, list: Box<Expr> },
    GetAzs,
    Sub(String),
    List(Vec<Expr>),
}

impl Expr {
    /// `Fn::Join` with an empty delimiter
    #[must_use]
    pub fn concat(parts: Vec<Expr>) -> Self {
        Expr::Join {
            delimiter: String::new(),
            parts,
        }
    }

    /// `Fn::Select [index, Fn::GetAZs ""]`
    #[must_use]
    pub fn availability_zone(index: usize) -> Self {
        Expr::Select {
            index,
            list: Box::new(Expr::GetAzs),
        }
    }

    /// Convert rendered ARN parts, substituting each token from `tokens`
    pub fn from_arn_parts(parts: Vec<ArnPart>, tokens: &[(&str, Expr)]) -> Result<Self> {
        let mut exprs = Vec::with_capacity(parts.len());
        for part in parts {
            let expr = match part {
                ArnPart::Text(text) => Expr::Literal(text),
                ArnPart::Partition => Expr::Pseudo(Pseudo::Partition),
                ArnPart::Region => Expr::Pseudo(Pseudo::Region),
                ArnPart::Account => Expr::Pseudo(Pseudo::AccountId),
                ArnPart::Token(token) => tokens
                    .iter()
                    .find(|(name, _)| *name == token)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| {
                        StackError::invalid_property("arn", token, "no value supplied for token")
                    })?,
            };
            exprs.push(expr);
        }
        Ok(Expr::concat(exprs))
    }

    /// Whether the value is fixed at definition time
    #[must_use]
    pub fn is_literal(&self) -> bool {
        match self {
            Expr::Literal(_) | Expr::Number(_) | Expr::Bool(_) => true,
            Expr::List(items) => items.iter().all(Expr::is_literal),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Logical IDs this value depends on
    #[must_use]
    pub fn references(&self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references(&self, found: &mut BTreeSet<String>) {
        match self {
            Expr::Ref(id) | Expr::GetAtt { target: id, .. } => {
                found.insert(id.to_string());
            }
            Expr::Join { parts, .. } => parts.iter().for_each(|p| p.collect_references(found)),
            Expr::List(items) => items.iter().for_each(|i| i.collect_references(found)),
            Expr::Select { list, .. } => list.collect_references(found),
            Expr::Sub(template) => found.extend(sub_references(template)),
            Expr::Literal(_)
            | Expr::Number(_)
            | Expr::Bool(_)
            | Expr::Pseudo(_)
            | Expr::GetAzs => {}
        }
    }
}

/// Resource names referenced by `${...}` placeholders, excluding pseudo parameters
pub(crate) fn sub_references(template: &str) -> impl Iterator<Item = String> + '_ {
    SUB_PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !name.contains("::"))
        .map(str::to_string)
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Number(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Bool(value)
    }
}

impl From<Pseudo> for Expr {
    fn from(value: Pseudo) -> Self {
        Expr::Pseudo(value)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expr::Literal(value) => serializer.serialize_str(value),
            Expr::Number(value) => serializer.serialize_i64(*value),
            Expr::Bool(value) => serializer.serialize_bool(*value),
            Expr::Ref(id) => single_key(serializer, "Ref", id.as_str()),
            Expr::Pseudo(pseudo) => single_key(serializer, "Ref", pseudo.as_str()),
            Expr::GetAtt { target, attribute } => {
                single_key(serializer, "Fn::GetAtt", &[target.as_str(), attribute.as_str()])
            }
            Expr::Join { delimiter, parts } => {
                single_key(serializer, "Fn::Join", &JoinArgs { delimiter, parts })
            }
            Expr::Select { index, list } => single_key(
                serializer,
                "Fn::Select",
                &SelectArgs {
                    index: *index,
                    list,
                },
            ),
            Expr::GetAzs => single_key(serializer, "Fn::GetAZs", ""),
            Expr::Sub(template) => single_key(serializer, "Fn::Sub", template),
            Expr::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

fn single_key<S: Serializer, V: Serialize + ?Sized>(
    serializer: S,
    key: &str,
    value: &V,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

struct JoinArgs<'a> {
    delimiter: &'a str,
    parts: &'a [Expr],
}

impl Serialize for JoinArgs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(self.delimiter)?;
        seq.serialize_element(self.parts)?;
        seq.end()
    }
}

struct SelectArgs<'a> {
    index: usize,
    list: &'a Expr,
}

impl Serialize for SelectArgs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.index)?;
        seq.serialize_element(self.list)?;
        seq.end()
    }
}
