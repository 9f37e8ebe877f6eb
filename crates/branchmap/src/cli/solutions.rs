//! `branchmap solutions` command implementation.

use std::path::Path;

use anyhow::Result;
use branchmap::ItemQuery;
use colored::Colorize;

use super::open_context;

/// Run the solutions command.
pub async fn run(branch: &Path) -> Result<()> {
    let context = open_context(branch).await?;
    let solutions = context.get_solutions(&ItemQuery::new());

    if solutions.is_empty() {
        println!("{}", "No solutions in the database.".dimmed());
        return Ok(());
    }

    for solution in solutions {
        let mut line = format!("  {}", solution.name.white().bold());
        if !solution.builds.is_empty() {
            line.push_str(&format!(" [{}]", solution.builds.join(", ").yellow()));
        }
        if !solution.does_exist {
            line.push_str(&format!(" {}", "missing".red()));
        }
        println!("{line}");
        println!(
            "    {} projects, {} wix projects",
            solution.projects.len(),
            solution.wix_projects.len()
        );
    }

    Ok(())
}
