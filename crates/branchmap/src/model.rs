//! Record types of the branch dependency graph.
//!
//! Three record kinds share the [`SchemaRecord`] identity contract:
//! a unique name per kind, an absolute path that is the identity key, an
//! existence flag and an ordered diagnostic list. Relationships between
//! records are stored as names on both sides.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecordError, Severity};

/// Which registry a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A `.sln` file.
    Solution,
    /// A `.csproj`, `.dbproj` or `.sqlproj` file.
    Project,
    /// A `.wixproj` file.
    WixProject,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solution => write!(f, "solution"),
            Self::Project => write!(f, "project"),
            Self::WixProject => write!(f, "wix project"),
        }
    }
}

/// Identity and diagnostics shared by every record kind.
pub trait SchemaRecord {
    /// The registry this record belongs to.
    const KIND: RecordKind;

    /// Create a placeholder record for a path seen for the first time.
    fn create(name: String, path: PathBuf, does_exist: bool) -> Self;

    /// Unique name within the record kind.
    fn name(&self) -> &str;

    /// Absolute path; the identity key.
    fn path(&self) -> &Path;

    /// Whether the file was present when the record was created.
    fn does_exist(&self) -> bool;

    /// Diagnostics recorded against this record, in order.
    fn errors(&self) -> &[RecordError];

    /// Mutable access for the builder.
    fn errors_mut(&mut self) -> &mut Vec<RecordError>;

    /// Whether a build definition reaches this record.
    fn is_required(&self) -> bool;

    /// Whether this record is a test project. Only projects can be.
    fn is_test(&self) -> bool {
        false
    }

    /// Highest severity among the record's diagnostics.
    fn worst_severity(&self) -> Option<Severity> {
        self.errors().iter().map(|e| e.severity).max()
    }
}

/// How a solution file declares a project's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    /// Verbose MSBuild XML (classic project system GUID).
    OldStyle,
    /// `<Project Sdk="...">` (CPS project system GUID).
    SdkStyle,
    /// GUID not in the known table.
    Unknown,
}

/// A project as listed by a solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SolutionProjectReference {
    /// Name of the project record
    pub project_name: String,
    /// Format declared by the solution's type GUID
    pub project_type: ProjectType,
}

/// Link between a wix project and a project.
///
/// Stored on both sides: on the wix project `name` is the project's name,
/// on the project it is the wix project's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WixProjectReference {
    /// Name of the record on the other side of the link
    #[serde(rename = "ProjectName")]
    pub name: String,
    /// `true` when the link was discovered only by harvesting a `.wxs`
    /// file, `false` for a declared `<ProjectReference>`
    pub is_manually_harvested: bool,
}

impl WixProjectReference {
    /// Create a link.
    #[must_use]
    pub fn new(name: impl Into<String>, is_manually_harvested: bool) -> Self {
        Self {
            name: name.into(),
            is_manually_harvested,
        }
    }
}

/// A C#, database or SQL project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectRecord {
    /// Unique project name
    pub name: String,
    /// Absolute path of the project file
    pub path: PathBuf,
    /// Whether the project file exists
    pub does_exist: bool,
    /// Diagnostics
    pub errors: Vec<RecordError>,
    /// Output assembly name (no extension)
    pub assembly_name: String,
    /// Debug symbol file name
    pub pdb_file_name: String,
    /// SDK-style project format
    pub is_sdk: bool,
    /// Targets netstandard2.x
    pub is_net_standard2: bool,
    /// Uses `PackageReference` (no `packages.config` beside it)
    pub is_package_ref: bool,
    /// Test project
    pub is_test_project: bool,
    /// Reached from a build definition
    pub is_required: bool,
    /// Solutions listing this project
    pub solutions: Vec<String>,
    /// Projects this project references
    pub references: Vec<String>,
    /// Projects referencing this project
    pub referenced_by: Vec<String>,
    /// Wix projects shipping this project
    pub wix_projects: Vec<WixProjectReference>,
}

impl SchemaRecord for ProjectRecord {
    const KIND: RecordKind = RecordKind::Project;

    fn create(name: String, path: PathBuf, does_exist: bool) -> Self {
        Self {
            assembly_name: name.clone(),
            pdb_file_name: format!("{name}.pdb"),
            name,
            path,
            does_exist,
            errors: Vec::new(),
            is_sdk: false,
            is_net_standard2: false,
            is_package_ref: false,
            is_test_project: false,
            is_required: false,
            solutions: Vec::new(),
            references: Vec::new(),
            referenced_by: Vec::new(),
            wix_projects: Vec::new(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn does_exist(&self) -> bool {
        self.does_exist
    }

    fn errors(&self) -> &[RecordError] {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Vec<RecordError> {
        &mut self.errors
    }

    fn is_required(&self) -> bool {
        self.is_required
    }

    fn is_test(&self) -> bool {
        self.is_test_project
    }
}

/// A Visual Studio solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SolutionRecord {
    /// Unique solution name
    pub name: String,
    /// Absolute path of the `.sln` file
    pub path: PathBuf,
    /// Whether the solution file exists
    pub does_exist: bool,
    /// Diagnostics
    pub errors: Vec<RecordError>,
    /// Named by at least one build definition
    pub is_required: bool,
    /// Build definitions building this solution
    pub builds: Vec<String>,
    /// Projects listed by the solution
    pub projects: Vec<SolutionProjectReference>,
    /// Wix projects listed by the solution
    pub wix_projects: Vec<String>,
}

impl SchemaRecord for SolutionRecord {
    const KIND: RecordKind = RecordKind::Solution;

    fn create(name: String, path: PathBuf, does_exist: bool) -> Self {
        Self {
            name,
            path,
            does_exist,
            errors: Vec::new(),
            is_required: false,
            builds: Vec::new(),
            projects: Vec::new(),
            wix_projects: Vec::new(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn does_exist(&self) -> bool {
        self.does_exist
    }

    fn errors(&self) -> &[RecordError] {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Vec<RecordError> {
        &mut self.errors
    }

    fn is_required(&self) -> bool {
        self.is_required
    }
}

/// A WiX installer project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WixProjectRecord {
    /// Unique wix project name
    pub name: String,
    /// Absolute path of the `.wixproj` file
    pub path: PathBuf,
    /// Whether the wix project file exists
    pub does_exist: bool,
    /// Diagnostics
    pub errors: Vec<RecordError>,
    /// SDK-style (`WixToolset.Sdk`) project format
    pub is_sdk: bool,
    /// Uses `PackageReference` (no `packages.config` beside it)
    pub is_package_ref: bool,
    /// Belongs to a required solution
    pub is_required: bool,
    /// Projects this installer ships
    pub project_references: Vec<WixProjectReference>,
    /// Solutions listing this wix project
    pub solutions: Vec<String>,
}

impl SchemaRecord for WixProjectRecord {
    const KIND: RecordKind = RecordKind::WixProject;

    fn create(name: String, path: PathBuf, does_exist: bool) -> Self {
        Self {
            name,
            path,
            does_exist,
            errors: Vec::new(),
            is_sdk: false,
            is_package_ref: false,
            is_required: false,
            project_references: Vec::new(),
            solutions: Vec::new(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn does_exist(&self) -> bool {
        self.does_exist
    }

    fn errors(&self) -> &[RecordError] {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Vec<RecordError> {
        &mut self.errors
    }

    fn is_required(&self) -> bool {
        self.is_required
    }
}

/// A diagnostic in the database-wide error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseError {
    /// Kind of the record the diagnostic belongs to
    pub kind: RecordKind,
    /// Name of the record
    pub name: String,
    /// Path of the record
    pub path: PathBuf,
    /// Severity
    pub severity: Severity,
    /// Message
    pub message: String,
    /// Rendered underlying error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({}): [{}] {}",
            self.kind,
            self.name,
            self.path.display(),
            self.severity,
            self.message
        )
    }
}

/// The finished graph of one branch, as persisted in `db.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BranchDatabase {
    /// When the snapshot was created
    pub generated_at: DateTime<Utc>,
    /// All solutions, sorted by name
    pub solutions: Vec<SolutionRecord>,
    /// All projects, sorted by name
    pub projects: Vec<ProjectRecord>,
    /// All wix projects, sorted by name
    pub wix_projects: Vec<WixProjectRecord>,
    /// Every record diagnostic, in the order it was raised
    pub errors: Vec<DatabaseError>,
}

impl BranchDatabase {
    /// An empty database.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            solutions: Vec::new(),
            projects: Vec::new(),
            wix_projects: Vec::new(),
            errors: Vec::new(),
        }
    }
}
