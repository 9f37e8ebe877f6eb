//! `branchmap branches` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use branchmap::{LocalFileStorage, list_branches};
use colored::Colorize;

use super::display::print_names;

/// Run the branches command.
pub async fn run(root: &Path) -> Result<()> {
    let branches = list_branches(&LocalFileStorage::new(), root)
        .await
        .with_context(|| format!("failed to list {}", root.display()))?;

    println!("{}", root.display().to_string().cyan().bold());
    print_names(branches.iter().map(String::as_str), "(no branches)");
    Ok(())
}
