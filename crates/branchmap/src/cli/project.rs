//! `branchmap project` command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use colored::Colorize;

use super::display::{print_names, print_record_errors, project_flags};
use super::open_context;

/// Run the project command.
pub async fn run(branch: &Path, name: &str) -> Result<()> {
    let context = open_context(branch).await?;
    let Some(project) = context.get_project(name) else {
        bail!("project not found: {name}");
    };

    println!("{} {}", project.name.cyan().bold(), project_flags(project));
    println!("  {}: {}", "Path".white().bold(), project.path.display());
    println!("  {}: {}", "Assembly".white().bold(), project.assembly_name);
    println!("  {}: {}", "Symbols".white().bold(), project.pdb_file_name);

    let builds = context.get_build_definition_names(name).unwrap_or_default();
    println!("  {}:", "Builds".white().bold());
    print_names(builds.iter().map(String::as_str), "(none)");

    println!("  {}:", "Solutions".white().bold());
    print_names(project.solutions.iter().map(String::as_str), "(none)");

    println!("  {}:", "References".white().bold());
    print_names(project.references.iter().map(String::as_str), "(none)");

    println!("  {}:", "Referenced by".white().bold());
    print_names(project.referenced_by.iter().map(String::as_str), "(none)");

    println!("  {}:", "Installers".white().bold());
    print_names(
        project.wix_projects.iter().map(|w| w.name.as_str()),
        "(not shipped by any installer)",
    );

    if !project.errors.is_empty() {
        println!("  {}:", "Diagnostics".white().bold());
        print_record_errors(&project.errors);
    }

    Ok(())
}
