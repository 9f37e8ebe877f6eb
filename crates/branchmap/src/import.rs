//! Recursive import of solutions, projects and wix projects.
//!
//! Every handler follows the same shape:
//!
//! 1. Register (or look up) the record for the path.
//! 2. Return it unchanged if the file does not exist or has already been
//!    claimed in [`ScannedFiles`].
//! 3. Otherwise scan the file and import everything it references,
//!    linking both ends of each relationship through the builder.
//!
//! Step 2 makes the recursion terminate on cyclic reference graphs: the
//! file that closes a cycle is already claimed when it is reached again, so
//! each file is scanned at most once per run.
//!
//! Step 3 runs inside a failure boundary. Anything that goes wrong while
//! handling one file becomes a `Critical` diagnostic on that record and the
//! run moves on. Only cancellation propagates.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tracing::{debug, info};

use crate::builder::{AvailableProjects, BranchDatabaseBuilder};
use crate::cancel::CancellationToken;
use crate::config::BuildDefinition;
use crate::error::{Error, Result};
use crate::model::{BranchDatabase, ProjectRecord, SolutionRecord, WixProjectRecord};
use crate::paths::{self, PathKey};
use crate::scan::{
    PACKAGES_CONFIG, WxsSources, scan_project, scan_solution, scan_wix_component,
    scan_wix_project,
};
use crate::storage::FileStorage;

/// Paths claimed for scanning during one run.
///
/// A path is inserted right before its file is scanned; a second insert of
/// the same path reports `false`, which is what stops re-scans and cycles.
/// Paths are compared by [`PathKey`], ignoring case.
#[derive(Debug, Clone, Default)]
pub struct ScannedFiles {
    paths: HashSet<PathKey>,
}

impl ScannedFiles {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path`. Returns `false` if it was already claimed.
    pub fn insert(&mut self, path: &Path) -> bool {
        self.paths.insert(PathKey::new(path))
    }

    /// Whether `path` has been claimed.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&PathKey::new(path))
    }

    /// Number of claimed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing has been claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Drives the scanners over one branch and feeds the builder.
pub struct Importer<'a> {
    storage: Arc<dyn FileStorage>,
    builder: &'a mut BranchDatabaseBuilder,
    scanned: &'a mut ScannedFiles,
    cancel: CancellationToken,
}

impl<'a> Importer<'a> {
    /// Create an importer writing into `builder` and claiming paths in
    /// `scanned`.
    pub fn new(
        storage: Arc<dyn FileStorage>,
        builder: &'a mut BranchDatabaseBuilder,
        scanned: &'a mut ScannedFiles,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            storage,
            builder,
            scanned,
            cancel,
        }
    }

    /// Whether the file at `path` should be skipped: absent on disk or
    /// already claimed. Claims it otherwise.
    fn should_skip(&mut self, path: &Path, does_exist: bool) -> bool {
        !does_exist || !self.scanned.insert(path)
    }

    fn has_packages_config(&self, file: &Path) -> bool {
        file.parent()
            .is_some_and(|dir| self.storage.file_exists(&dir.join(PACKAGES_CONFIG)))
    }

    // === Solutions ===

    /// Import a solution and everything it lists.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if the run was cancelled. Any other failure
    /// is recorded on the solution.
    pub async fn import_solution(&mut self, path: &Path) -> Result<SolutionRecord> {
        let solution = self.builder.get_or_add_solution(path);
        if self.should_skip(path, solution.does_exist) {
            return Ok(solution);
        }

        debug!(path = %path.display(), "Importing solution");
        if let Err(e) = self.import_solution_body(&solution).await {
            if e.is_cancelled() {
                return Err(e);
            }
            self.builder
                .add_critical(&solution, "Failed to import solution", &e);
        }

        Ok(self.current_solution(path, solution))
    }

    async fn import_solution_body(&mut self, solution: &SolutionRecord) -> Result<()> {
        self.cancel.check()?;
        let text = self
            .storage
            .read_all_text(&solution.path, &self.cancel)
            .await?;
        let scan = scan_solution(&solution.path, &text);

        for message in &scan.errors {
            self.builder.add_warning(solution, message.clone());
        }

        for entry in &scan.projects {
            let project = self.import_project(&entry.path).await?;
            self.builder
                .add_project_to_solution(solution, &project, entry.project_type);
        }

        let available = self.builder.get_projects_available_for_installers(solution);
        for wix_path in &scan.wix_projects {
            let wix = self.import_wix_project(wix_path, &available).await?;
            self.builder.add_wix_project_to_solution(solution, &wix);
        }

        debug!(
            name = %solution.name,
            projects = scan.projects.len(),
            wix_projects = scan.wix_projects.len(),
            "Imported solution"
        );
        Ok(())
    }

    // === Projects ===

    /// Import a project and, recursively, every project it references.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if the run was cancelled. Any other failure
    /// is recorded on the project.
    pub fn import_project<'p>(
        &'p mut self,
        path: &'p Path,
    ) -> LocalBoxFuture<'p, Result<ProjectRecord>> {
        async move {
            let project = self.builder.get_or_add_project(path);
            if self.should_skip(path, project.does_exist) {
                return Ok(project);
            }

            debug!(path = %path.display(), "Importing project");
            if let Err(e) = self.import_project_body(&project).await {
                if e.is_cancelled() {
                    return Err(e);
                }
                self.builder
                    .add_critical(&project, "Failed to import project", &e);
            }

            Ok(self.current_project(path, project))
        }
        .boxed_local()
    }

    async fn import_project_body(&mut self, project: &ProjectRecord) -> Result<()> {
        self.cancel.check()?;
        let text = self
            .storage
            .read_all_text(&project.path, &self.cancel)
            .await?;
        ensure_msbuild(&project.path, &text)?;
        let scan = scan_project(
            &project.path,
            &text,
            self.has_packages_config(&project.path),
        );

        let mut updated = project.clone();
        updated.assembly_name = scan.assembly_name;
        updated.pdb_file_name = scan.pdb_file_name;
        updated.is_sdk = scan.is_sdk;
        updated.is_net_standard2 = scan.is_net_standard2;
        updated.is_package_ref = scan.is_package_ref;
        updated.is_test_project = scan.is_test_project;
        self.builder.update_project(updated);

        for reference_path in &scan.project_references {
            let referenced = self.import_project(reference_path).await?;
            self.builder.add_project_reference(project, &referenced);
        }
        Ok(())
    }

    // === Wix projects ===

    /// Import a wix project, validating its references against the
    /// projects `available` to its owning solution.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if the run was cancelled. Any other failure
    /// is recorded on the wix project.
    pub async fn import_wix_project(
        &mut self,
        path: &Path,
        available: &AvailableProjects,
    ) -> Result<WixProjectRecord> {
        let wix = self.builder.get_or_add_wix_project(path);
        if self.should_skip(path, wix.does_exist) {
            return Ok(wix);
        }

        debug!(path = %path.display(), "Importing wix project");
        if let Err(e) = self.import_wix_project_body(&wix, available).await {
            if e.is_cancelled() {
                return Err(e);
            }
            self.builder
                .add_critical(&wix, "Failed to import wix project", &e);
        }

        Ok(self.current_wix_project(path, wix))
    }

    async fn import_wix_project_body(
        &mut self,
        wix: &WixProjectRecord,
        available: &AvailableProjects,
    ) -> Result<()> {
        self.cancel.check()?;
        let text = self.storage.read_all_text(&wix.path, &self.cancel).await?;
        ensure_msbuild(&wix.path, &text)?;
        let scan = scan_wix_project(&wix.path, &text, self.has_packages_config(&wix.path));

        let mut updated = wix.clone();
        updated.is_sdk = scan.is_sdk;
        updated.is_package_ref = scan.is_package_ref;
        self.builder.update_wix_project(updated);

        for reference_path in &scan.project_references {
            let Some(target) = available.by_path(reference_path) else {
                self.builder.add_warning(
                    wix,
                    format!(
                        "Project reference {} is not available to this installer's solution",
                        reference_path.display()
                    ),
                );
                continue;
            };
            if let Some(project) = self.builder.project(&target.path).cloned() {
                self.builder.add_wix_project_reference(wix, &project, false);
            }
        }

        let sources = match scan.sources {
            WxsSources::Explicit(files) => files,
            WxsSources::Directory(dir) => {
                self.storage
                    .get_file_paths(&dir, "*.wxs", true, &self.cancel)
                    .await?
            }
        };

        let mut harvested: BTreeMap<String, PathBuf> = BTreeMap::new();
        for source in &sources {
            self.cancel.check()?;
            if !self.storage.file_exists(source) {
                self.builder.add_warning(
                    wix,
                    format!("Component file {} does not exist", source.display()),
                );
                continue;
            }
            let text = self.storage.read_all_text(source, &self.cancel).await?;
            for file_name in scan_wix_component(&text) {
                self.record_harvest(wix, available, &file_name, source, &mut harvested);
            }
        }
        Ok(())
    }

    /// Link one harvested assembly to the project producing it.
    fn record_harvest(
        &mut self,
        wix: &WixProjectRecord,
        available: &AvailableProjects,
        file_name: &str,
        source: &Path,
        harvested: &mut BTreeMap<String, PathBuf>,
    ) {
        let key = file_name.to_ascii_lowercase();
        if let Some(first) = harvested.get(&key) {
            self.builder.add_warning(
                wix,
                format!(
                    "Assembly {file_name} is harvested more than once ({} and {})",
                    first.display(),
                    source.display()
                ),
            );
            return;
        }
        harvested.insert(key, source.to_path_buf());

        let Some(target) = available.by_assembly_file(file_name) else {
            debug!(
                wix = %wix.name,
                file = file_name,
                "Harvested file is not produced by an available project"
            );
            return;
        };
        if let Some(project) = self.builder.project(&target.path).cloned() {
            self.builder.add_wix_project_reference(wix, &project, true);
        }
    }

    // === Helpers ===

    fn current_solution(&self, path: &Path, fallback: SolutionRecord) -> SolutionRecord {
        self.builder.solution(path).cloned().unwrap_or(fallback)
    }

    fn current_project(&self, path: &Path, fallback: ProjectRecord) -> ProjectRecord {
        self.builder.project(path).cloned().unwrap_or(fallback)
    }

    fn current_wix_project(&self, path: &Path, fallback: WixProjectRecord) -> WixProjectRecord {
        self.builder.wix_project(path).cloned().unwrap_or(fallback)
    }
}

/// Reject files that are not MSBuild XML at all (binary junk, merge
/// conflict leftovers truncated to nothing).
fn ensure_msbuild(path: &Path, text: &str) -> Result<()> {
    if text.to_ascii_lowercase().contains("<project") {
        Ok(())
    } else {
        Err(Error::Scan(format!(
            "{} has no <Project> element",
            path.display()
        )))
    }
}

/// Inputs for a whole-branch import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Build definitions; their solutions seed required status
    pub build_definitions: Vec<BuildDefinition>,
    /// Also import every `*.sln` under the branch root
    pub include_all_solutions: bool,
}

/// Outcome of a whole-branch import.
#[derive(Debug)]
pub struct ImportOutcome {
    /// The finished graph
    pub database: BranchDatabase,
    /// Every path scanned during the run
    pub scanned: ScannedFiles,
}

/// Import a branch from scratch.
///
/// Solutions named by build definitions are imported first, in order, and
/// tagged with their build names. With `include_all_solutions`, the
/// remaining `*.sln` files under `branch_root` follow.
///
/// A relative `branch_root` is resolved against the current directory, so
/// every stored path is absolute and normalized.
///
/// # Errors
///
/// - `Error::Cancelled` if the run was cancelled
/// - `Error::Io` if the branch root cannot be resolved or enumerated
pub async fn import_branch(
    storage: Arc<dyn FileStorage>,
    branch_root: &Path,
    options: &ImportOptions,
    cancel: CancellationToken,
) -> Result<ImportOutcome> {
    let branch_root = paths::absolute(branch_root)?;
    let branch_root = branch_root.as_path();
    debug!(root = %branch_root.display(), "Importing branch");

    let mut builder = BranchDatabaseBuilder::new(Arc::clone(&storage));
    let mut scanned = ScannedFiles::new();

    {
        let mut importer = Importer::new(
            Arc::clone(&storage),
            &mut builder,
            &mut scanned,
            cancel.clone(),
        );

        for definition in &options.build_definitions {
            let path = definition.solution_path(branch_root);
            let solution = importer.import_solution(&path).await?;
            importer.builder.add_build_solution(&solution, &definition.name);
            if !solution.does_exist {
                importer.builder.add_error(
                    &solution,
                    format!("Build definition {} names a missing solution", definition.name),
                    None,
                );
            }
        }

        if options.include_all_solutions {
            let solutions = storage
                .get_file_paths(branch_root, "*.sln", true, &cancel)
                .await?;
            for path in solutions {
                importer.import_solution(&paths::normalize(&path)).await?;
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let database = builder.create_database();
    info!(
        solutions = database.solutions.len(),
        projects = database.projects.len(),
        wix_projects = database.wix_projects.len(),
        errors = database.errors.len(),
        scanned = scanned.len(),
        "Branch import complete"
    );
    Ok(ImportOutcome { database, scanned })
}

/// Branch names under a branches root: its immediate subdirectories,
/// sorted, skipping hidden ones.
///
/// # Errors
///
/// Returns `Error::Io` if `root` cannot be read.
pub async fn list_branches(storage: &dyn FileStorage, root: &Path) -> Result<Vec<String>> {
    let mut names = storage.get_directory_names(root).await?;
    names.retain(|name| !name.starts_with('.'));
    names.sort();
    Ok(names)
}
