//! # Synthesis Configuration
//!
//! Settings loaded from environment variables, overridable from the command
//! line.

use crate::constants::{
    DEFAULT_LOG_LEVEL, DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_FORMAT, DEFAULT_STACK_NAME,
};
use crate::stack::{Environment, StackProps};
use crate::synth::OutputFormat;
use std::path::PathBuf;
use tracing::warn;

/// Synthesis settings
///
/// All settings have defaults and can be overridden via environment
/// variables; a `.env` file in the working directory is loaded first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthConfig {
    /// Stack name (`STACK_NAME`)
    pub stack_name: String,
    /// Target account (`CDK_DEFAULT_ACCOUNT`); environment-agnostic when unset
    pub account: Option<String>,
    /// Target region (`CDK_DEFAULT_REGION`); environment-agnostic when unset
    pub region: Option<String>,
    /// Cloud assembly directory (`SYNTH_OUTPUT_DIR`)
    pub output_dir: PathBuf,
    /// Template rendering (`SYNTH_OUTPUT_FORMAT`)
    pub output_format: OutputFormat,
    /// Directory function sources are resolved against (`PROJECT_DIR`)
    pub project_dir: PathBuf,
    /// Log level (`LOG_LEVEL`)
    pub log_level: String,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            account: None,
            region: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_format: OutputFormat::Json,
            project_dir: PathBuf::from("."),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl SynthConfig {
    /// Load configuration from the process environment with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = var_or_default(&lookup, "SYNTH_OUTPUT_FORMAT", DEFAULT_OUTPUT_FORMAT);
        let output_format = format.parse().unwrap_or_else(|_| {
            warn!(format = %format, "Unknown SYNTH_OUTPUT_FORMAT, using {DEFAULT_OUTPUT_FORMAT}");
            OutputFormat::Json
        });

        Self {
            stack_name: var_or_default(&lookup, "STACK_NAME", DEFAULT_STACK_NAME),
            account: var_non_empty(&lookup, "CDK_DEFAULT_ACCOUNT"),
            region: var_non_empty(&lookup, "CDK_DEFAULT_REGION"),
            output_dir: PathBuf::from(var_or_default(
                &lookup,
                "SYNTH_OUTPUT_DIR",
                DEFAULT_OUTPUT_DIR,
            )),
            output_format,
            project_dir: PathBuf::from(var_or_default(&lookup, "PROJECT_DIR", ".")),
            log_level: var_or_default(&lookup, "LOG_LEVEL", DEFAULT_LOG_LEVEL),
        }
    }

    /// Stack properties carrying the configured environment
    #[must_use]
    pub fn stack_props(&self) -> StackProps {
        let env = (self.account.is_some() || self.region.is_some()).then(|| Environment {
            account: self.account.clone(),
            region: self.region.clone(),
        });
        StackProps {
            env,
            ..StackProps::default()
        }
    }
}

/// Read variable as string or return default
fn var_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    var_non_empty(lookup, key).unwrap_or_else(|| default.to_string())
}

fn var_non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
