//! # Graph Command
//!
//! Lists declared resources in creation order.

use super::StackInput;
use anyhow::{Context, Result};
use lambda_rds_stack::stack::define_in;

pub fn graph_command(input: &StackInput) -> Result<()> {
    let graph = define_in(&input.project_dir, &input.name, input.props.clone())
        .with_context(|| format!("Failed to define stack {}", input.name))?;

    println!("{:<48} {:<42} {:<50}", "LOGICAL ID", "TYPE", "PATH");
    println!("{}", "-".repeat(142));

    for resource in graph.resources() {
        println!(
            "{:<48} {:<42} {:<50}",
            resource.logical_id().as_str(),
            resource.resource_type(),
            resource.path()
        );
        for dependency in graph.dependencies(resource.logical_id().as_str()) {
            println!("    -> {dependency}");
        }
    }

    println!("\n{} resources", graph.resources().len());
    Ok(())
}
