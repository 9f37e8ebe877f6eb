//! Graph builder for one scan run.
//!
//! [`BranchDatabaseBuilder`] owns a registry per record kind. Each registry
//! is keyed by path (the identity) with a secondary unique-name index. The
//! builder is the only writer: import handlers read copies of records, then
//! hand scanned properties back through `update_*` and relationships through
//! the `add_*` calls, each of which writes both sides of the edge.
//!
//! A fresh builder is created for every run and consumed by
//! [`BranchDatabaseBuilder::create_database`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{RecordError, Severity};
use crate::model::{
    BranchDatabase, DatabaseError, ProjectRecord, ProjectType, RecordKind, SchemaRecord,
    SolutionProjectReference, SolutionRecord, WixProjectRecord, WixProjectReference,
};
use crate::paths::{PathKey, base_name};
use crate::storage::FileStorage;

/// Path-keyed record store with unique names.
///
/// Lookups go through [`PathKey`], so differently cased spellings of one
/// file reach the same record.
#[derive(Debug)]
struct Registry<R> {
    by_path: HashMap<PathKey, R>,
    by_name: HashMap<String, PathKey>,
}

impl<R: SchemaRecord + Clone> Registry<R> {
    fn new() -> Self {
        Self {
            by_path: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Return the record for `path`, creating it on first sight.
    ///
    /// `exists` is only consulted when the record is created.
    fn get_or_add(&mut self, path: &Path, exists: impl FnOnce(&Path) -> bool) -> &R {
        let key = PathKey::new(path);
        if !self.by_path.contains_key(&key) {
            let name = self.unique_name(&base_name(path));
            let does_exist = exists(path);
            debug!(
                kind = %R::KIND,
                name = %name,
                path = %path.display(),
                does_exist,
                "Registered record"
            );
            self.by_name.insert(name.clone(), key.clone());
            self.by_path
                .insert(key.clone(), R::create(name, path.to_path_buf(), does_exist));
        }
        &self.by_path[&key]
    }

    /// `base`, or `base-1`, `base-2`, ... whichever is free first.
    fn unique_name(&self, base: &str) -> String {
        if !self.by_name.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.by_name.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn get(&self, path: &Path) -> Option<&R> {
        self.by_path.get(&PathKey::new(path))
    }

    fn get_mut(&mut self, path: &Path) -> Option<&mut R> {
        self.by_path.get_mut(&PathKey::new(path))
    }

    fn get_by_name(&self, name: &str) -> Option<&R> {
        self.by_name.get(name).and_then(|key| self.by_path.get(key))
    }

    fn get_by_name_mut(&mut self, name: &str) -> Option<&mut R> {
        let key = self.by_name.get(name)?;
        self.by_path.get_mut(key)
    }

    fn len(&self) -> usize {
        self.by_path.len()
    }

    /// All records sorted by name.
    fn into_sorted(self) -> Vec<R> {
        let mut records: Vec<R> = self.by_path.into_values().collect();
        records.sort_by(|a, b| a.name().cmp(b.name()));
        records
    }
}

/// A project an installer of one solution may legitimately ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableProject {
    /// Project name
    pub name: String,
    /// Project path
    pub path: PathBuf,
    /// Output assembly name, without extension
    pub assembly_name: String,
}

/// The closed world a wix project's references are validated against.
///
/// Built by [`BranchDatabaseBuilder::get_projects_available_for_installers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableProjects {
    projects: Vec<AvailableProject>,
}

impl AvailableProjects {
    /// Projects in the set, sorted by name.
    #[must_use]
    pub fn projects(&self) -> &[AvailableProject] {
        &self.projects
    }

    /// Number of projects in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Find a project by its path, ignoring case.
    #[must_use]
    pub fn by_path(&self, path: &Path) -> Option<&AvailableProject> {
        let key = PathKey::new(path);
        self.projects.iter().find(|p| PathKey::new(&p.path) == key)
    }

    /// Find the project producing a harvested file such as `App.dll`.
    ///
    /// The comparison ignores ASCII case and the `.dll` extension.
    #[must_use]
    pub fn by_assembly_file(&self, file_name: &str) -> Option<&AvailableProject> {
        let stem = file_name
            .len()
            .checked_sub(4)
            .filter(|&cut| file_name.is_char_boundary(cut))
            .filter(|&cut| file_name[cut..].eq_ignore_ascii_case(".dll"))
            .map_or(file_name, |cut| &file_name[..cut]);
        self.projects
            .iter()
            .find(|p| p.assembly_name.eq_ignore_ascii_case(stem))
    }
}

/// Builds the record graph of one branch.
pub struct BranchDatabaseBuilder {
    storage: Arc<dyn FileStorage>,
    projects: Registry<ProjectRecord>,
    solutions: Registry<SolutionRecord>,
    wix_projects: Registry<WixProjectRecord>,
    errors: Vec<DatabaseError>,
}

impl std::fmt::Debug for BranchDatabaseBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchDatabaseBuilder")
            .field("projects", &self.projects.len())
            .field("solutions", &self.solutions.len())
            .field("wix_projects", &self.wix_projects.len())
            .field("errors", &self.errors.len())
            .finish_non_exhaustive()
    }
}

impl BranchDatabaseBuilder {
    /// Create an empty builder. `storage` answers existence checks for
    /// newly registered paths.
    #[must_use]
    pub fn new(storage: Arc<dyn FileStorage>) -> Self {
        Self {
            storage,
            projects: Registry::new(),
            solutions: Registry::new(),
            wix_projects: Registry::new(),
            errors: Vec::new(),
        }
    }

    // === Registries ===

    /// Get the project registered for `path`, registering it on first sight.
    pub fn get_or_add_project(&mut self, path: &Path) -> ProjectRecord {
        let storage = &self.storage;
        self.projects
            .get_or_add(path, |p| storage.file_exists(p))
            .clone()
    }

    /// Get the solution registered for `path`, registering it on first sight.
    pub fn get_or_add_solution(&mut self, path: &Path) -> SolutionRecord {
        let storage = &self.storage;
        self.solutions
            .get_or_add(path, |p| storage.file_exists(p))
            .clone()
    }

    /// Get the wix project registered for `path`, registering it on first
    /// sight.
    pub fn get_or_add_wix_project(&mut self, path: &Path) -> WixProjectRecord {
        let storage = &self.storage;
        self.wix_projects
            .get_or_add(path, |p| storage.file_exists(p))
            .clone()
    }

    /// Current state of the project at `path`.
    #[must_use]
    pub fn project(&self, path: &Path) -> Option<&ProjectRecord> {
        self.projects.get(path)
    }

    /// Current state of the solution at `path`.
    #[must_use]
    pub fn solution(&self, path: &Path) -> Option<&SolutionRecord> {
        self.solutions.get(path)
    }

    /// Current state of the wix project at `path`.
    #[must_use]
    pub fn wix_project(&self, path: &Path) -> Option<&WixProjectRecord> {
        self.wix_projects.get(path)
    }

    /// Store the scanned properties of a project.
    ///
    /// Identity (name, path, existence), diagnostics and relationship lists
    /// belong to the builder and are kept; everything else is replaced.
    /// Unknown paths are ignored.
    pub fn update_project(&mut self, record: ProjectRecord) {
        let Some(existing) = self.projects.get_mut(&record.path) else {
            warn!(path = %record.path.display(), "Update for unregistered project ignored");
            return;
        };
        existing.assembly_name = record.assembly_name;
        existing.pdb_file_name = record.pdb_file_name;
        existing.is_sdk = record.is_sdk;
        existing.is_net_standard2 = record.is_net_standard2;
        existing.is_package_ref = record.is_package_ref;
        existing.is_test_project = record.is_test_project;
    }

    /// Store the scanned properties of a wix project.
    ///
    /// Same ownership rules as [`update_project`](Self::update_project).
    pub fn update_wix_project(&mut self, record: WixProjectRecord) {
        let Some(existing) = self.wix_projects.get_mut(&record.path) else {
            warn!(path = %record.path.display(), "Update for unregistered wix project ignored");
            return;
        };
        existing.is_sdk = record.is_sdk;
        existing.is_package_ref = record.is_package_ref;
    }

    // === Relationships ===

    /// Record that `from` references `to`, on both records.
    ///
    /// Self-references and cycles are recorded as given. Repeated calls are
    /// no-ops.
    pub fn add_project_reference(&mut self, from: &ProjectRecord, to: &ProjectRecord) {
        if self.projects.get(&from.path).is_none() || self.projects.get(&to.path).is_none() {
            warn!(
                from = %from.path.display(),
                to = %to.path.display(),
                "Reference between unregistered projects ignored"
            );
            return;
        }
        if let Some(source) = self.projects.get_mut(&from.path) {
            push_unique(&mut source.references, &to.name);
        }
        if let Some(target) = self.projects.get_mut(&to.path) {
            push_unique(&mut target.referenced_by, &from.name);
        }
    }

    /// Record that `solution` lists `project`, on both records.
    pub fn add_project_to_solution(
        &mut self,
        solution: &SolutionRecord,
        project: &ProjectRecord,
        project_type: ProjectType,
    ) {
        if self.solutions.get(&solution.path).is_none() || self.projects.get(&project.path).is_none()
        {
            return;
        }
        if let Some(sln) = self.solutions.get_mut(&solution.path) {
            if !sln.projects.iter().any(|p| p.project_name == project.name) {
                sln.projects.push(SolutionProjectReference {
                    project_name: project.name.clone(),
                    project_type,
                });
            }
        }
        if let Some(proj) = self.projects.get_mut(&project.path) {
            push_unique(&mut proj.solutions, &solution.name);
        }
    }

    /// Record that `solution` lists `wix_project`, on both records.
    pub fn add_wix_project_to_solution(
        &mut self,
        solution: &SolutionRecord,
        wix_project: &WixProjectRecord,
    ) {
        if self.solutions.get(&solution.path).is_none()
            || self.wix_projects.get(&wix_project.path).is_none()
        {
            return;
        }
        if let Some(sln) = self.solutions.get_mut(&solution.path) {
            push_unique(&mut sln.wix_projects, &wix_project.name);
        }
        if let Some(wix) = self.wix_projects.get_mut(&wix_project.path) {
            push_unique(&mut wix.solutions, &solution.name);
        }
    }

    /// Record that `wix_project` ships `project`, on both records.
    ///
    /// A declared reference outranks a harvested one: linking an already
    /// harvested project through a declaration clears the harvested flag,
    /// the reverse leaves it declared. Returns `true` if the link is new.
    pub fn add_wix_project_reference(
        &mut self,
        wix_project: &WixProjectRecord,
        project: &ProjectRecord,
        is_manually_harvested: bool,
    ) -> bool {
        if self.wix_projects.get(&wix_project.path).is_none()
            || self.projects.get(&project.path).is_none()
        {
            return false;
        }
        let mut added = false;
        if let Some(wix) = self.wix_projects.get_mut(&wix_project.path) {
            added = link_wix(&mut wix.project_references, &project.name, is_manually_harvested);
        }
        if let Some(proj) = self.projects.get_mut(&project.path) {
            link_wix(&mut proj.wix_projects, &wix_project.name, is_manually_harvested);
        }
        added
    }

    /// Record that build definition `build_name` builds `solution`.
    ///
    /// A solution named by any build definition is required.
    pub fn add_build_solution(&mut self, solution: &SolutionRecord, build_name: &str) {
        if let Some(sln) = self.solutions.get_mut(&solution.path) {
            push_unique(&mut sln.builds, build_name);
            sln.is_required = true;
        }
    }

    // === Diagnostics ===

    /// Attach a warning to a record.
    pub fn add_warning<R: SchemaRecord>(&mut self, record: &R, message: impl Into<String>) {
        self.add_diagnostic(record, RecordError::new(Severity::Warning, message));
    }

    /// Attach an error to a record, optionally with the error that caused it.
    pub fn add_error<R: SchemaRecord>(
        &mut self,
        record: &R,
        message: impl Into<String>,
        exception: Option<&(dyn std::error::Error + 'static)>,
    ) {
        let mut diagnostic = RecordError::new(Severity::Error, message);
        if let Some(exception) = exception {
            diagnostic = diagnostic.with_exception(exception);
        }
        self.add_diagnostic(record, diagnostic);
    }

    /// Attach a critical error: the record's scan failed part way.
    pub fn add_critical<R: SchemaRecord>(
        &mut self,
        record: &R,
        message: impl Into<String>,
        exception: &(dyn std::error::Error + 'static),
    ) {
        let diagnostic = RecordError::new(Severity::Critical, message).with_exception(exception);
        self.add_diagnostic(record, diagnostic);
    }

    fn add_diagnostic<R: SchemaRecord>(&mut self, record: &R, diagnostic: RecordError) {
        warn!(
            kind = %R::KIND,
            name = %record.name(),
            severity = %diagnostic.severity,
            message = %diagnostic.message,
            "Record diagnostic"
        );
        let path = record.path();
        let errors = match R::KIND {
            RecordKind::Project => self.projects.get_mut(path).map(SchemaRecord::errors_mut),
            RecordKind::Solution => self.solutions.get_mut(path).map(SchemaRecord::errors_mut),
            RecordKind::WixProject => self.wix_projects.get_mut(path).map(SchemaRecord::errors_mut),
        };
        let Some(errors) = errors else {
            return;
        };
        errors.push(diagnostic.clone());
        self.errors.push(DatabaseError {
            kind: R::KIND,
            name: record.name().to_string(),
            path: path.to_path_buf(),
            severity: diagnostic.severity,
            message: diagnostic.message,
            exception: diagnostic.exception,
        });
    }

    // === Installer scope ===

    /// Existing, non-test projects reachable from `solution` through its
    /// project list and their references.
    #[must_use]
    pub fn get_projects_available_for_installers(
        &self,
        solution: &SolutionRecord,
    ) -> AvailableProjects {
        let Some(solution) = self.solutions.get(&solution.path) else {
            return AvailableProjects::default();
        };

        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = solution
            .projects
            .iter()
            .map(|p| p.project_name.as_str())
            .collect();
        let mut projects = Vec::new();

        while let Some(name) = stack.pop() {
            if !seen.insert(name) {
                continue;
            }
            let Some(project) = self.projects.get_by_name(name) else {
                continue;
            };
            if project.does_exist && !project.is_test_project {
                projects.push(AvailableProject {
                    name: project.name.clone(),
                    path: project.path.clone(),
                    assembly_name: project.assembly_name.clone(),
                });
            }
            stack.extend(project.references.iter().map(String::as_str));
        }

        projects.sort_by(|a, b| a.name.cmp(&b.name));
        AvailableProjects { projects }
    }

    // === Snapshot ===

    /// Number of diagnostics raised so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Finish the run: propagate required status and snapshot the
    /// registries. Call only after every import has completed.
    #[must_use]
    pub fn create_database(mut self) -> BranchDatabase {
        self.propagate_required();

        let mut database = BranchDatabase::empty();
        database.solutions = self.solutions.into_sorted();
        database.projects = self.projects.into_sorted();
        database.wix_projects = self.wix_projects.into_sorted();
        database.errors = self.errors;
        database
    }

    /// Mark everything reachable from a required solution as required.
    ///
    /// Done once at the end so the result does not depend on which solution
    /// happened to reach a shared project first.
    fn propagate_required(&mut self) {
        let required: Vec<(Vec<String>, Vec<String>)> = self
            .solutions
            .by_path
            .values()
            .filter(|s| s.is_required)
            .map(|s| {
                (
                    s.projects.iter().map(|p| p.project_name.clone()).collect(),
                    s.wix_projects.clone(),
                )
            })
            .collect();

        let mut visited: HashSet<String> = HashSet::new();
        for (projects, wix_projects) in required {
            let mut stack = projects;
            while let Some(name) = stack.pop() {
                if !visited.insert(name.clone()) {
                    continue;
                }
                if let Some(project) = self.projects.get_by_name_mut(&name) {
                    project.is_required = true;
                    stack.extend(project.references.iter().cloned());
                }
            }
            for name in wix_projects {
                if let Some(wix) = self.wix_projects.get_by_name_mut(&name) {
                    wix.is_required = true;
                }
            }
        }
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}

fn link_wix(list: &mut Vec<WixProjectReference>, name: &str, is_manually_harvested: bool) -> bool {
    if let Some(existing) = list.iter_mut().find(|r| r.name == name) {
        existing.is_manually_harvested &= is_manually_harvested;
        false
    } else {
        list.push(WixProjectReference::new(name, is_manually_harvested));
        true
    }
}
