//! # Synth Command
//!
//! Defines the stack and writes (or prints) the cloud assembly.

use super::StackInput;
use anyhow::{Context, Result};
use lambda_rds_stack::stack::define_in;
use lambda_rds_stack::synth::{write_assembly, OutputFormat};
use std::path::Path;

pub fn synth_command(
    input: &StackInput,
    output_dir: &Path,
    format: OutputFormat,
    stdout: bool,
) -> Result<()> {
    let graph = define_in(&input.project_dir, &input.name, input.props.clone())
        .with_context(|| format!("Failed to define stack {}", input.name))?;

    if stdout {
        let rendered = graph
            .to_template()
            .render(format)
            .context("Failed to render template")?;
        println!("{rendered}");
        return Ok(());
    }

    let written = write_assembly(&graph, output_dir, format)
        .with_context(|| format!("Failed to write cloud assembly to {}", output_dir.display()))?;

    println!(
        "Synthesized {} ({} resources, {} outputs)",
        graph.stack_name(),
        graph.resources().len(),
        graph.outputs().len()
    );
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}
