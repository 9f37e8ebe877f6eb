//! YAML configuration for a branch.
//!
//! Lives at `<branch>/branchmap.yaml`:
//!
//! ```yaml
//! build-definitions:
//!   - name: CI-App
//!     solution: Main/App.sln
//! include-all-solutions: false
//! data-dir: .branchmap
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::paths::{has_extension, resolve_declared};

/// Default configuration file name, at the branch root.
pub const CONFIG_FILE_NAME: &str = "branchmap.yaml";

/// Default data directory, relative to the branch root.
pub const DEFAULT_DATA_DIR: &str = ".branchmap";

/// Name of the persisted graph inside the data directory.
pub const DATABASE_FILE_NAME: &str = "db.json";

/// A named build pipeline and the solution it builds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildDefinition {
    /// Build name, e.g. `CI-App`
    pub name: String,
    /// Solution path, relative to the branch root or absolute
    pub solution: String,
}

impl BuildDefinition {
    /// Create a build definition.
    pub fn new(name: impl Into<String>, solution: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            solution: solution.into(),
        }
    }

    /// Absolute, normalized path of the solution for a branch.
    #[must_use]
    pub fn solution_path(&self, branch_root: &Path) -> PathBuf {
        resolve_declared(branch_root, &self.solution)
    }
}

impl std::str::FromStr for BuildDefinition {
    type Err = Error;

    /// Parse `NAME=SOLUTION`, as given on the command line.
    fn from_str(s: &str) -> Result<Self> {
        let (name, solution) = s.split_once('=').ok_or_else(|| {
            Error::Config(format!("build definition '{s}' must look like NAME=SOLUTION"))
        })?;
        Ok(Self::new(name.trim(), solution.trim()))
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BranchMapConfig {
    /// Solutions whose projects are required, in import order
    #[serde(default)]
    pub build_definitions: Vec<BuildDefinition>,

    /// Also import every `*.sln` under the branch root
    #[serde(default)]
    pub include_all_solutions: bool,

    /// Where `db.json` lives, relative to the branch root
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

impl Default for BranchMapConfig {
    fn default() -> Self {
        Self {
            build_definitions: Vec::new(),
            include_all_solutions: false,
            data_dir: default_data_dir(),
        }
    }
}

impl BranchMapConfig {
    /// Load and validate a configuration file.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// - `Error::Io` if the file exists but cannot be read
    /// - `Error::Config` if it is not valid YAML or fails validation
    pub async fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = Self::from_yaml(&content)?;
        debug!(
            path = %path.display(),
            build_definitions = config.build_definitions.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate YAML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on malformed YAML or invalid values.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // serde_yaml reads an empty document as unit, not as an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if serialization fails
    /// - `Error::Io` if the file cannot be written
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check build definitions.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty build name, a solution path that
    /// is not a `.sln`, or an empty data directory.
    pub fn validate(&self) -> Result<()> {
        for (index, definition) in self.build_definitions.iter().enumerate() {
            if definition.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Build definition #{} has an empty name",
                    index + 1
                )));
            }
            if !has_extension(Path::new(&definition.solution), "sln") {
                return Err(Error::Config(format!(
                    "Build definition {} must name a .sln file, got '{}'",
                    definition.name, definition.solution
                )));
            }
        }
        if self.data_dir.trim().is_empty() {
            return Err(Error::Config("data-dir cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Absolute data directory for a branch.
    #[must_use]
    pub fn data_dir_path(&self, branch_root: &Path) -> PathBuf {
        resolve_declared(branch_root, &self.data_dir)
    }

    /// Absolute path of `db.json` for a branch.
    #[must_use]
    pub fn database_path(&self, branch_root: &Path) -> PathBuf {
        self.data_dir_path(branch_root).join(DATABASE_FILE_NAME)
    }
}
