//! CLI command implementations.

mod display;

pub mod branches;
pub mod cycles;
pub mod errors;
pub mod init;
pub mod installers;
pub mod project;
pub mod references;
pub mod scan;
pub mod solutions;
pub mod stats;

use std::path::Path;

use anyhow::{Context, Result};
use branchmap::{BranchDatabaseContext, BranchDatabaseFactory, BranchMapConfig, Error};
use branchmap::config::CONFIG_FILE_NAME;

/// Open the saved database of a branch.
async fn open_context(branch: &Path) -> Result<BranchDatabaseContext> {
    let config = BranchMapConfig::load(&branch.join(CONFIG_FILE_NAME))
        .await
        .context("failed to load configuration")?;
    let factory = BranchDatabaseFactory::for_branch(branch, &config);

    match factory.open().await {
        Ok(context) => Ok(context),
        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => anyhow::bail!(
            "no database at {}; run `branchmap scan` first",
            factory.database_path().display()
        ),
        Err(e) => Err(e).with_context(|| {
            format!(
                "failed to open database {}",
                factory.database_path().display()
            )
        }),
    }
}
