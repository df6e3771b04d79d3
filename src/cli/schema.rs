//! # Schema Command
//!
//! Prints the JSON Schema of the `--props` file.

use anyhow::{Context, Result};
use lambda_rds_stack::stack::StackProps;

pub fn schema_command() -> Result<()> {
    let schema = schemars::schema_for!(StackProps);
    let rendered = serde_json::to_string_pretty(&schema).context("Failed to render schema")?;
    println!("{rendered}");
    Ok(())
}
