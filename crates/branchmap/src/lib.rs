//! # Branchmap: dependency graph of a legacy .NET branch
//!
//! Branchmap reads the build files of a branch at rest (Visual Studio
//! solutions, old-style and SDK-style project files, WiX installer projects
//! and their `.wxs` components) and builds one graph of what exists and what
//! references what. The graph answers migration questions: what depends on
//! a project, whether any shipped installer needs it, whether it has moved
//! to `PackageReference`, SDK-style or netstandard2.
//!
//! ## Pipeline
//!
//! - [`scan`]: pure scanners, one per file format
//! - [`BranchDatabaseBuilder`]: per-run registries and two-sided edges
//! - [`import`]: recursive import of solutions, projects and installers,
//!   each file scanned at most once
//! - [`BranchDatabaseContext`]: name-indexed queries over the finished graph
//! - [`persist`]: the `db.json` snapshot
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use branchmap::{
//!     BranchDatabaseContext, BranchMapConfig, CancellationToken, ImportOptions, ItemQuery,
//!     LocalFileStorage, import_branch,
//! };
//!
//! # async fn example() -> branchmap::Result<()> {
//! let branch = Path::new("/src/main");
//! let config = BranchMapConfig::load(&branch.join("branchmap.yaml")).await?;
//! let options = ImportOptions {
//!     build_definitions: config.build_definitions.clone(),
//!     include_all_solutions: config.include_all_solutions,
//! };
//!
//! let outcome = import_branch(
//!     Arc::new(LocalFileStorage::new()),
//!     branch,
//!     &options,
//!     CancellationToken::new(),
//! )
//! .await?;
//!
//! let context = BranchDatabaseContext::new(outcome.database);
//! let dependents = context
//!     .get_projects_referenced_by("Contoso.Core", &ItemQuery::new().recursive())
//!     .unwrap_or_default();
//! println!("{} projects depend on Contoso.Core", dependents.len());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cancel;
pub mod config;
pub mod context;
mod error;
pub mod import;
pub mod model;
pub mod paths;
pub mod persist;
pub mod query;
pub mod scan;
pub mod storage;

pub use builder::{AvailableProject, AvailableProjects, BranchDatabaseBuilder};
pub use cancel::CancellationToken;
pub use config::{BranchMapConfig, BuildDefinition};
pub use context::{BranchDatabaseContext, BranchDatabaseFactory, DatabaseStats, InstallerLink};
pub use error::{Error, RecordError, Result, Severity};
pub use import::{ImportOptions, ImportOutcome, Importer, ScannedFiles, import_branch, list_branches};
pub use model::{
    BranchDatabase, DatabaseError, ProjectRecord, ProjectType, RecordKind, SchemaRecord,
    SolutionProjectReference, SolutionRecord, WixProjectRecord, WixProjectReference,
};
pub use persist::{load_database, save_database};
pub use query::{ItemQuery, RequiredFilter};
pub use storage::{FileStorage, InMemoryFileStorage, LocalFileStorage};
