//! `branchmap cycles` command implementation.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use super::open_context;

/// Run the cycles command.
pub async fn run(branch: &Path) -> Result<()> {
    let context = open_context(branch).await?;

    let cycles = context.get_reference_cycles();

    if cycles.is_empty() {
        println!("{}", "No circular project references detected.".green());
        return Ok(());
    }

    println!(
        "Found {} circular reference groups:",
        cycles.len().to_string().red().bold()
    );
    println!();

    for (i, cycle) in cycles.iter().enumerate() {
        println!("  {} {}:", "Cycle".yellow().bold(), i + 1);
        println!("    {}", cycle.join(", ").dimmed());
    }

    Ok(())
}
