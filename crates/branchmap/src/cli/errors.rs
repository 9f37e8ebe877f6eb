//! `branchmap errors` command implementation.

use std::path::Path;

use anyhow::Result;
use branchmap::Severity;
use colored::Colorize;

use super::display::severity_label;
use super::open_context;

/// Run the errors command.
pub async fn run(branch: &Path, min_severity: Severity) -> Result<()> {
    let context = open_context(branch).await?;
    let errors = context.get_errors(min_severity);

    if errors.is_empty() {
        println!(
            "{}",
            format!("No diagnostics at {min_severity} or above.").green()
        );
        return Ok(());
    }

    for error in errors {
        println!(
            "{} {} {}: {}",
            severity_label(error.severity),
            error.kind.to_string().dimmed(),
            error.name.white().bold(),
            error.message
        );
        if let Some(exception) = &error.exception {
            println!("    {}", exception.dimmed());
        }
    }

    Ok(())
}
