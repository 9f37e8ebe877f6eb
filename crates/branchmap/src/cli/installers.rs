//! `branchmap installers` command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use branchmap::ItemQuery;
use colored::Colorize;

use super::open_context;

/// Run the installers command.
pub async fn run(branch: &Path, name: &str, recursive: bool) -> Result<()> {
    let context = open_context(branch).await?;
    let query = if recursive {
        ItemQuery::new().recursive()
    } else {
        ItemQuery::new()
    };

    let Some(links) = context.get_wix_projects_for_project(name, &query) else {
        bail!("project not found: {name}");
    };

    if links.is_empty() {
        println!(
            "{} is not shipped by any installer.",
            name.cyan().bold()
        );
        return Ok(());
    }

    println!(
        "{} is shipped by {} installers:",
        name.cyan().bold(),
        links.len().to_string().green()
    );
    for link in links {
        let how = if link.is_manually_harvested {
            "harvested".yellow()
        } else {
            "referenced".green()
        };
        let mut line = format!("  {} ({how})", link.wix_project.name.white().bold());
        if let Some(via) = link.via {
            line.push_str(&format!(" {}", format!("via {via}").dimmed()));
        }
        println!("{line}");
    }

    Ok(())
}
