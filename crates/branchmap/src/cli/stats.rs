//! `branchmap stats` command implementation.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use super::open_context;

/// Run the stats command.
pub async fn run(branch: &Path) -> Result<()> {
    let context = open_context(branch).await?;
    let stats = context.stats();
    let generated_at = context.database().generated_at;

    println!("{}", "Branchmap Database Statistics".cyan().bold());
    println!();
    println!(
        "  {}: {}",
        "Generated".white().bold(),
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    println!(
        "  {}: {}",
        "Solutions".white().bold(),
        stats.solutions.to_string().green()
    );
    println!(
        "  {}: {} ({} required)",
        "Projects".white().bold(),
        stats.projects.to_string().green(),
        stats.required_projects
    );
    println!(
        "  {}: {}",
        "Wix projects".white().bold(),
        stats.wix_projects.to_string().green()
    );
    println!(
        "  {}: {}",
        "Missing files".white().bold(),
        stats.placeholders
    );
    println!();

    println!("  {}:", "Diagnostics".white().bold());
    println!("    {}: {}", "warning".dimmed(), stats.warnings);
    println!("    {}: {}", "error".dimmed(), stats.errors);
    println!("    {}: {}", "critical".dimmed(), stats.critical);

    Ok(())
}
