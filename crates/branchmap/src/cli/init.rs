//! `branchmap init` command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use branchmap::config::CONFIG_FILE_NAME;
use branchmap::{BranchMapConfig, BuildDefinition};
use colored::Colorize;

/// Write `branchmap.yaml` at the branch root.
pub async fn run(
    branch: &Path,
    build_definitions: Vec<BuildDefinition>,
    all_solutions: bool,
    force: bool,
) -> Result<()> {
    let config_path = branch.join(CONFIG_FILE_NAME);
    if !force && tokio::fs::try_exists(&config_path).await.unwrap_or(false) {
        bail!(
            "{} already exists; use --force to overwrite it",
            config_path.display()
        );
    }

    let config = BranchMapConfig {
        build_definitions,
        include_all_solutions: all_solutions,
        ..BranchMapConfig::default()
    };
    config.validate().context("invalid configuration")?;
    config
        .save(&config_path)
        .await
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!("{} {}", "Wrote".green().bold(), config_path.display());
    for definition in &config.build_definitions {
        println!("  {} -> {}", definition.name.cyan(), definition.solution);
    }
    if config.build_definitions.is_empty() && !config.include_all_solutions {
        println!(
            "{}: no build definitions; add some with --build NAME=SOLUTION",
            "Warning".yellow().bold()
        );
    }

    Ok(())
}
