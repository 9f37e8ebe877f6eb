//! `branchmap scan` command implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use branchmap::config::CONFIG_FILE_NAME;
use branchmap::{
    BranchDatabaseContext, BranchMapConfig, CancellationToken, ImportOptions, LocalFileStorage,
    import_branch, save_database,
};
use colored::Colorize;

/// Run the scan command.
pub async fn run(branch: &Path, config_path: Option<&Path>, all_solutions: bool) -> Result<()> {
    let config_path = config_path.map_or_else(|| branch.join(CONFIG_FILE_NAME), Path::to_path_buf);
    let config = BranchMapConfig::load(&config_path)
        .await
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let options = ImportOptions {
        build_definitions: config.build_definitions.clone(),
        include_all_solutions: config.include_all_solutions || all_solutions,
    };
    if options.build_definitions.is_empty() && !options.include_all_solutions {
        println!(
            "{}: no build definitions configured; use --all-solutions to scan every solution",
            "Warning".yellow().bold()
        );
    }

    let start = Instant::now();
    let outcome = import_branch(
        Arc::new(LocalFileStorage::new()),
        branch,
        &options,
        CancellationToken::new(),
    )
    .await
    .context("scan failed")?;

    let database_path = config.database_path(branch);
    save_database(&database_path, &outcome.database)
        .await
        .with_context(|| format!("failed to write {}", database_path.display()))?;

    let stats = BranchDatabaseContext::new(outcome.database).stats();
    println!(
        "{} {} files in {:.2}s",
        "Scanned".green().bold(),
        outcome.scanned.len(),
        start.elapsed().as_secs_f64()
    );
    println!(
        "  {} solutions, {} projects ({} required), {} wix projects",
        stats.solutions, stats.projects, stats.required_projects, stats.wix_projects
    );
    if stats.placeholders > 0 {
        println!(
            "  {} referenced files do not exist",
            stats.placeholders.to_string().yellow()
        );
    }
    if stats.warnings + stats.errors + stats.critical > 0 {
        println!(
            "  {} warnings, {} errors, {} critical (see `branchmap errors`)",
            stats.warnings.to_string().yellow(),
            stats.errors.to_string().red(),
            stats.critical.to_string().red().bold()
        );
    }
    println!("  {}: {}", "Database".white().bold(), database_path.display());

    Ok(())
}
