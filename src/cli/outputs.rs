//! # Outputs Command
//!
//! Lists the values the stack exports after apply.

use super::StackInput;
use anyhow::{Context, Result};
use lambda_rds_stack::stack::define_in;

pub fn outputs_command(input: &StackInput) -> Result<()> {
    let graph = define_in(&input.project_dir, &input.name, input.props.clone())
        .with_context(|| format!("Failed to define stack {}", input.name))?;

    if graph.outputs().is_empty() {
        println!("No outputs declared.");
        return Ok(());
    }

    for output in graph.outputs() {
        let value = serde_json::to_string(&output.value).context("Failed to render output value")?;
        println!("{:<24} {value}", output.name);
    }
    Ok(())
}
