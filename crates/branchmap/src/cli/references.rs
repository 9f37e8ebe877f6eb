//! `branchmap references` command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use branchmap::{ItemQuery, RequiredFilter};
use colored::Colorize;

use super::display::print_project_line;
use super::open_context;

/// Options of the references command.
#[derive(Debug, Default)]
pub struct Filter {
    /// Follow references transitively
    pub recursive: bool,
    /// Walk incoming references
    pub incoming: bool,
    /// Only required projects
    pub required: bool,
    /// Only non-required projects
    pub non_required: bool,
    /// Drop test projects
    pub exclude_tests: bool,
    /// Name substring
    pub search: Option<String>,
}

impl Filter {
    fn to_query(&self) -> ItemQuery {
        let required = match (self.required, self.non_required) {
            (true, _) => RequiredFilter::OnlyRequired,
            (false, true) => RequiredFilter::OnlyNonRequired,
            (false, false) => RequiredFilter::All,
        };
        let mut query = ItemQuery::new().with_required(required);
        if self.recursive {
            query = query.recursive();
        }
        if self.exclude_tests {
            query = query.excluding_tests();
        }
        if let Some(search) = &self.search {
            query = query.with_search(search.clone());
        }
        query
    }
}

/// Run the references command.
pub async fn run(branch: &Path, name: &str, filter: Filter) -> Result<()> {
    let context = open_context(branch).await?;
    let query = filter.to_query();

    let found = if filter.incoming {
        context.get_projects_referenced_by(name, &query)
    } else {
        context.get_projects_referencing(name, &query)
    };
    let Some(found) = found else {
        bail!("project not found: {name}");
    };

    let label = match (filter.incoming, filter.recursive) {
        (false, false) => "references",
        (false, true) => "depends on",
        (true, false) => "is referenced by",
        (true, true) => "is needed by",
    };
    println!(
        "{} {label} {} projects:",
        name.cyan().bold(),
        found.len().to_string().green()
    );

    if found.is_empty() {
        println!("    {}", "(none)".dimmed());
    }
    for project in found {
        print_project_line(project);
    }

    Ok(())
}
