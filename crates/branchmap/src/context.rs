//! Read-side query engine over a finished graph.
//!
//! [`BranchDatabaseContext`] indexes a [`BranchDatabase`] by name once and
//! answers lookups and closure queries against it. The project reference
//! graph is mirrored into a petgraph `DiGraph` (edge `A -> B` when `A`
//! references `B`); it may contain cycles.
//!
//! Unknown names are reported as `None`, never as errors.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::config::{BranchMapConfig, DATABASE_FILE_NAME};
use crate::error::{Result, Severity};
use crate::model::{BranchDatabase, DatabaseError, ProjectRecord, SolutionRecord, WixProjectRecord};
use crate::persist::load_database;
use crate::query::ItemQuery;

/// An installer shipping a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallerLink<'a> {
    /// The wix project
    pub wix_project: &'a WixProjectRecord,
    /// Linked by harvesting rather than a declared reference
    pub is_manually_harvested: bool,
    /// For transitive queries: the dependent project the installer ships,
    /// `None` when it ships the queried project itself
    pub via: Option<&'a str>,
}

/// Record and diagnostic counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Solutions
    pub solutions: usize,
    /// Projects
    pub projects: usize,
    /// Wix projects
    pub wix_projects: usize,
    /// Projects reached from a build definition
    pub required_projects: usize,
    /// Records whose file does not exist, all kinds
    pub placeholders: usize,
    /// Warning diagnostics
    pub warnings: usize,
    /// Error diagnostics
    pub errors: usize,
    /// Critical diagnostics
    pub critical: usize,
}

/// Name-indexed, read-only view of a branch database.
#[derive(Debug)]
pub struct BranchDatabaseContext {
    database: BranchDatabase,
    projects: HashMap<String, usize>,
    solutions: HashMap<String, usize>,
    wix_projects: HashMap<String, usize>,
    graph: DiGraph<usize, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl BranchDatabaseContext {
    /// Index a database.
    #[must_use]
    pub fn new(database: BranchDatabase) -> Self {
        let projects = index_by_name(database.projects.iter().map(|p| p.name.as_str()));
        let solutions = index_by_name(database.solutions.iter().map(|s| s.name.as_str()));
        let wix_projects = index_by_name(database.wix_projects.iter().map(|w| w.name.as_str()));

        let mut graph = DiGraph::new();
        let mut nodes = HashMap::with_capacity(database.projects.len());
        for (index, project) in database.projects.iter().enumerate() {
            nodes.insert(project.name.clone(), graph.add_node(index));
        }
        let mut dangling = 0usize;
        for project in &database.projects {
            let from = nodes[&project.name];
            for reference in &project.references {
                match nodes.get(reference) {
                    Some(&to) => {
                        graph.update_edge(from, to, ());
                    }
                    None => dangling += 1,
                }
            }
        }
        if dangling > 0 {
            debug!(dangling, "References to unknown projects skipped");
        }

        Self {
            database,
            projects,
            solutions,
            wix_projects,
            graph,
            nodes,
        }
    }

    /// The underlying snapshot.
    #[must_use]
    pub fn database(&self) -> &BranchDatabase {
        &self.database
    }

    // === Lookups ===

    /// Project by name.
    #[must_use]
    pub fn get_project(&self, name: &str) -> Option<&ProjectRecord> {
        self.projects.get(name).map(|&i| &self.database.projects[i])
    }

    /// Solution by name.
    #[must_use]
    pub fn get_solution(&self, name: &str) -> Option<&SolutionRecord> {
        self.solutions.get(name).map(|&i| &self.database.solutions[i])
    }

    /// Wix project by name.
    #[must_use]
    pub fn get_wix_project(&self, name: &str) -> Option<&WixProjectRecord> {
        self.wix_projects
            .get(name)
            .map(|&i| &self.database.wix_projects[i])
    }

    /// Projects passing `query`, sorted by name.
    #[must_use]
    pub fn get_projects(&self, query: &ItemQuery) -> Vec<&ProjectRecord> {
        sorted_by_name(
            self.database.projects.iter().filter(|p| query.is_active(*p)),
            |p| &p.name,
        )
    }

    /// Solutions passing `query`, sorted by name.
    #[must_use]
    pub fn get_solutions(&self, query: &ItemQuery) -> Vec<&SolutionRecord> {
        sorted_by_name(
            self.database.solutions.iter().filter(|s| query.is_active(*s)),
            |s| &s.name,
        )
    }

    /// Wix projects passing `query`, sorted by name.
    #[must_use]
    pub fn get_wix_projects(&self, query: &ItemQuery) -> Vec<&WixProjectRecord> {
        sorted_by_name(
            self.database
                .wix_projects
                .iter()
                .filter(|w| query.is_active(*w)),
            |w| &w.name,
        )
    }

    // === Closures ===

    /// Projects that `project` references.
    ///
    /// One hop, or the transitive closure when `query.recursive` is set.
    /// A project that fails the filter is dropped together with everything
    /// reachable only through it. Sorted by name; `None` if `project` is
    /// unknown.
    #[must_use]
    pub fn get_projects_referencing(
        &self,
        project: &str,
        query: &ItemQuery,
    ) -> Option<Vec<&ProjectRecord>> {
        self.closure(project, Direction::Outgoing, query)
    }

    /// Projects that reference `project`.
    ///
    /// Same traversal rules as
    /// [`get_projects_referencing`](Self::get_projects_referencing), walking
    /// edges backwards.
    #[must_use]
    pub fn get_projects_referenced_by(
        &self,
        project: &str,
        query: &ItemQuery,
    ) -> Option<Vec<&ProjectRecord>> {
        self.closure(project, Direction::Incoming, query)
    }

    fn closure(
        &self,
        project: &str,
        direction: Direction,
        query: &ItemQuery,
    ) -> Option<Vec<&ProjectRecord>> {
        let start = *self.nodes.get(project)?;

        let mut found: BTreeMap<&str, &ProjectRecord> = BTreeMap::new();
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut stack: Vec<NodeIndex> = self.graph.neighbors_directed(start, direction).collect();

        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            let record = &self.database.projects[self.graph[node]];
            if !query.is_active(record) {
                continue;
            }
            found.insert(record.name.as_str(), record);
            if query.recursive {
                stack.extend(
                    self.graph
                        .neighbors_directed(node, direction)
                        .filter(|next| !seen.contains(next)),
                );
            }
        }

        Some(found.into_values().collect())
    }

    // === Builds and installers ===

    /// Build definitions whose solutions list `project`, deduplicated and
    /// sorted. `None` if `project` is unknown.
    #[must_use]
    pub fn get_build_definition_names(&self, project: &str) -> Option<Vec<String>> {
        let project = self.get_project(project)?;
        let names: BTreeSet<&str> = project
            .solutions
            .iter()
            .filter_map(|name| self.get_solution(name))
            .flat_map(|solution| solution.builds.iter().map(String::as_str))
            .collect();
        Some(names.into_iter().map(str::to_string).collect())
    }

    /// Installers shipping `project`, sorted by wix project name.
    ///
    /// `query` filters the wix projects. With `query.recursive`, installers
    /// shipping any project that transitively references `project` count
    /// too, since they carry it along. `None` if `project` is unknown.
    #[must_use]
    pub fn get_wix_projects_for_project(
        &self,
        project: &str,
        query: &ItemQuery,
    ) -> Option<Vec<InstallerLink<'_>>> {
        let target = self.get_project(project)?;

        let mut carriers: Vec<&ProjectRecord> = vec![target];
        if query.recursive {
            let dependents = self.get_projects_referenced_by(project, &ItemQuery::new().recursive())?;
            carriers.extend(dependents.into_iter().filter(|p| p.name != target.name));
        }

        let mut links: BTreeMap<&str, InstallerLink<'_>> = BTreeMap::new();
        for carrier in carriers {
            let via = (carrier.name != target.name).then_some(carrier.name.as_str());
            for reference in &carrier.wix_projects {
                let Some(wix_project) = self.get_wix_project(&reference.name) else {
                    continue;
                };
                if !query.is_active(wix_project) {
                    continue;
                }
                // direct links win over transitive ones
                links
                    .entry(wix_project.name.as_str())
                    .or_insert(InstallerLink {
                        wix_project,
                        is_manually_harvested: reference.is_manually_harvested,
                        via,
                    });
            }
        }
        Some(links.into_values().collect())
    }

    // === Reports ===

    /// Groups of projects that reference each other in a loop.
    ///
    /// Each group is a strongly connected component with more than one
    /// project, or a single project referencing itself. Names within a group
    /// are sorted; groups are sorted by their first name.
    #[must_use]
    pub fn get_reference_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node| self.graph.contains_edge(node, node))
            })
            .map(|component| {
                let mut names: Vec<String> = component
                    .into_iter()
                    .map(|node| self.database.projects[self.graph[node]].name.clone())
                    .collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Database-wide diagnostics at or above `min_severity`, in the order
    /// they were raised.
    #[must_use]
    pub fn get_errors(&self, min_severity: Severity) -> Vec<&DatabaseError> {
        self.database
            .errors
            .iter()
            .filter(|e| e.severity >= min_severity)
            .collect()
    }

    /// Record and diagnostic counts.
    #[must_use]
    pub fn stats(&self) -> DatabaseStats {
        let db = &self.database;
        let mut stats = DatabaseStats {
            solutions: db.solutions.len(),
            projects: db.projects.len(),
            wix_projects: db.wix_projects.len(),
            required_projects: db.projects.iter().filter(|p| p.is_required).count(),
            placeholders: db.solutions.iter().filter(|s| !s.does_exist).count()
                + db.projects.iter().filter(|p| !p.does_exist).count()
                + db.wix_projects.iter().filter(|w| !w.does_exist).count(),
            ..DatabaseStats::default()
        };
        for error in &db.errors {
            match error.severity {
                Severity::Warning => stats.warnings += 1,
                Severity::Error => stats.errors += 1,
                Severity::Critical => stats.critical += 1,
            }
        }
        stats
    }
}

fn index_by_name<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    names
        .enumerate()
        .map(|(index, name)| (name.to_string(), index))
        .collect()
}

fn sorted_by_name<'a, R>(
    records: impl Iterator<Item = &'a R>,
    name: impl Fn(&R) -> &String,
) -> Vec<&'a R>
where
    R: 'a,
{
    let mut records: Vec<&R> = records.collect();
    records.sort_by(|a, b| name(*a).cmp(name(*b)));
    records
}

/// Opens the persisted database of a branch.
#[derive(Debug, Clone)]
pub struct BranchDatabaseFactory {
    data_dir: PathBuf,
}

impl BranchDatabaseFactory {
    /// Factory reading `<data_dir>/db.json`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Factory for a branch, using the configured data directory.
    #[must_use]
    pub fn for_branch(branch_root: &Path, config: &BranchMapConfig) -> Self {
        Self::new(config.data_dir_path(branch_root))
    }

    /// Path of the database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    /// Load the database and index it.
    ///
    /// # Errors
    ///
    /// - `Error::Io` of kind `NotFound` if the branch has not been scanned
    /// - `Error::Json` if the file is corrupt
    pub async fn open(&self) -> Result<BranchDatabaseContext> {
        let database = load_database(&self.database_path()).await?;
        Ok(BranchDatabaseContext::new(database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{DatabaseError, RecordKind, SchemaRecord, WixProjectReference};
    use crate::query::RequiredFilter;

    fn project(name: &str, references: &[&str]) -> ProjectRecord {
        let mut record =
            ProjectRecord::create(name.into(), PathBuf::from(format!("/b/{name}.csproj")), true);
        record.references = references.iter().map(|r| (*r).to_string()).collect();
        record
    }

    /// Fill in `referenced_by` from `references`.
    fn database(mut projects: Vec<ProjectRecord>) -> BranchDatabase {
        let edges: Vec<(String, String)> = projects
            .iter()
            .flat_map(|p| p.references.iter().map(|r| (p.name.clone(), r.clone())))
            .collect();
        for (from, to) in edges {
            if let Some(target) = projects.iter_mut().find(|p| p.name == to) {
                target.referenced_by.push(from);
            }
        }
        let mut db = BranchDatabase::empty();
        db.projects = projects;
        db
    }

    fn names(records: &[&ProjectRecord]) -> Vec<String> {
        records.iter().map(|p| p.name.clone()).collect()
    }

    fn diamond() -> BranchDatabaseContext {
        BranchDatabaseContext::new(database(vec![
            project("A", &["B", "C"]),
            project("B", &["D"]),
            project("C", &["D"]),
            project("D", &[]),
        ]))
    }

    #[test]
    fn diamond_closure_visits_each_node_once() {
        let ctx = diamond();

        let direct = ctx.get_projects_referencing("A", &ItemQuery::new()).expect("known");
        assert_eq!(names(&direct), ["B", "C"]);

        let all = ctx
            .get_projects_referencing("A", &ItemQuery::new().recursive())
            .expect("known");
        assert_eq!(names(&all), ["B", "C", "D"]);

        let up = ctx
            .get_projects_referenced_by("D", &ItemQuery::new().recursive())
            .expect("known");
        assert_eq!(names(&up), ["A", "B", "C"]);
    }

    #[test]
    fn filtered_node_prunes_its_subtree() {
        let mut db = database(vec![
            project("A", &["B", "C"]),
            project("B", &["D"]),
            project("C", &[]),
            project("D", &[]),
        ]);
        db.projects[1].is_test_project = true;
        let ctx = BranchDatabaseContext::new(db);

        let found = ctx
            .get_projects_referencing("A", &ItemQuery::new().recursive().excluding_tests())
            .expect("known");

        assert_eq!(names(&found), ["C"]);
    }

    #[test]
    fn cyclic_closure_terminates() {
        let ctx = BranchDatabaseContext::new(database(vec![
            project("A", &["B"]),
            project("B", &["C"]),
            project("C", &["A"]),
        ]));

        let found = ctx
            .get_projects_referencing("A", &ItemQuery::new().recursive())
            .expect("known");

        assert_eq!(names(&found), ["A", "B", "C"]);
    }

    #[test]
    fn unknown_names_are_absent() {
        let ctx = diamond();
        assert!(ctx.get_project("Nope").is_none());
        assert!(ctx.get_solution("Nope").is_none());
        assert!(ctx.get_projects_referencing("Nope", &ItemQuery::new()).is_none());
        assert!(ctx.get_build_definition_names("Nope").is_none());
    }

    #[test]
    fn listings_filter_and_sort() {
        let mut db = database(vec![project("Zed", &[]), project("Alpha", &[])]);
        db.projects[0].is_required = true;
        let ctx = BranchDatabaseContext::new(db);

        assert_eq!(names(&ctx.get_projects(&ItemQuery::new())), ["Alpha", "Zed"]);
        assert_eq!(
            names(&ctx.get_projects(&ItemQuery::new().with_required(RequiredFilter::OnlyRequired))),
            ["Zed"]
        );
    }

    #[test]
    fn build_names_are_flattened_and_deduplicated() {
        let mut db = database(vec![project("Core", &[])]);
        db.projects[0].solutions = vec!["App".into(), "Tools".into()];
        let mut app = SolutionRecord::create("App".into(), PathBuf::from("/b/App.sln"), true);
        app.builds = vec!["CI-App".into(), "Nightly".into()];
        let mut tools = SolutionRecord::create("Tools".into(), PathBuf::from("/b/Tools.sln"), true);
        tools.builds = vec!["Nightly".into()];
        db.solutions = vec![app, tools];
        let ctx = BranchDatabaseContext::new(db);

        assert_eq!(
            ctx.get_build_definition_names("Core").expect("known"),
            vec!["CI-App", "Nightly"]
        );
    }

    #[test]
    fn installers_direct_and_transitive() {
        let mut db = database(vec![project("App", &["Lib"]), project("Lib", &[])]);
        db.projects[0].wix_projects = vec![WixProjectReference::new("Setup", true)];
        let mut setup =
            WixProjectRecord::create("Setup".into(), PathBuf::from("/b/Setup.wixproj"), true);
        setup.project_references = vec![WixProjectReference::new("App", true)];
        db.wix_projects = vec![setup];
        let ctx = BranchDatabaseContext::new(db);

        let direct = ctx
            .get_wix_projects_for_project("App", &ItemQuery::new())
            .expect("known");
        assert_eq!(direct.len(), 1);
        assert!(direct[0].is_manually_harvested);
        assert_eq!(direct[0].via, None);

        assert!(ctx
            .get_wix_projects_for_project("Lib", &ItemQuery::new())
            .expect("known")
            .is_empty());

        let carried = ctx
            .get_wix_projects_for_project("Lib", &ItemQuery::new().recursive())
            .expect("known");
        assert_eq!(carried.len(), 1);
        assert_eq!(carried[0].wix_project.name, "Setup");
        assert_eq!(carried[0].via, Some("App"));
    }

    #[test]
    fn cycles_include_self_references_only_when_present() {
        let ctx = BranchDatabaseContext::new(database(vec![
            project("A", &["B"]),
            project("B", &["A"]),
            project("Loner", &[]),
            project("Selfie", &["Selfie"]),
        ]));

        assert_eq!(
            ctx.get_reference_cycles(),
            vec![vec!["A".to_string(), "B".to_string()], vec!["Selfie".to_string()]]
        );
        assert!(diamond().get_reference_cycles().is_empty());
    }

    #[test]
    fn errors_and_stats() {
        let mut db = database(vec![project("A", &[]), project("Gone", &[])]);
        db.projects[1].does_exist = false;
        db.projects[0].is_required = true;
        for severity in [Severity::Warning, Severity::Critical, Severity::Warning] {
            db.errors.push(DatabaseError {
                kind: RecordKind::Project,
                name: "A".into(),
                path: PathBuf::from("/b/A.csproj"),
                severity,
                message: "m".into(),
                exception: None,
            });
        }
        let ctx = BranchDatabaseContext::new(db);

        assert_eq!(ctx.get_errors(Severity::Warning).len(), 3);
        assert_eq!(ctx.get_errors(Severity::Error).len(), 1);

        let stats = ctx.stats();
        assert_eq!(stats.projects, 2);
        assert_eq!(stats.required_projects, 1);
        assert_eq!(stats.placeholders, 1);
        assert_eq!((stats.warnings, stats.errors, stats.critical), (2, 0, 1));
    }

    #[tokio::test]
    async fn factory_reports_missing_database() {
        let temp_dir = tempfile::TempDir::new().expect("create temp dir");
        let factory = BranchDatabaseFactory::for_branch(temp_dir.path(), &BranchMapConfig::default());

        let err = factory.open().await.expect_err("nothing scanned yet");

        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
        assert!(factory.database_path().ends_with(".branchmap/db.json"));
    }
}
