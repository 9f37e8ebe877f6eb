//! `db.json` persistence.
//!
//! The finished graph is written once per run as a single pretty-printed
//! JSON document and read back wholesale by later queries. Writes go to a
//! sibling `.tmp` file first and are renamed into place, so readers never
//! see a half-written database.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::BranchDatabase;

/// Write `database` to `path` atomically, creating the parent directory.
///
/// # Errors
///
/// - `Error::Json` if serialization fails
/// - `Error::Io` if the directory, temp file or rename fails
pub async fn save_database(path: &Path, database: &BranchDatabase) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(database)?;
    let temp_path = make_temp_path(path);

    if let Err(e) = write_temp_file(&temp_path, &json).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }
    fs::rename(&temp_path, path).await?;

    info!(
        path = %path.display(),
        bytes = json.len(),
        "Database written"
    );
    Ok(())
}

/// Read a database written by [`save_database`].
///
/// # Errors
///
/// - `Error::Io` if the file cannot be read (kind `NotFound` when absent)
/// - `Error::Json` if the content is not a database document
pub async fn load_database(path: &Path) -> Result<BranchDatabase> {
    let bytes = fs::read(path).await?;
    let database: BranchDatabase = serde_json::from_slice(&bytes)?;
    debug!(
        path = %path.display(),
        solutions = database.solutions.len(),
        projects = database.projects.len(),
        "Database loaded"
    );
    Ok(database)
}

/// `db.json` -> `db.json.tmp`
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let extension = match path.extension() {
        Some(ext) => {
            let mut ext = ext.to_os_string();
            ext.push(".tmp");
            ext
        }
        None => OsString::from("tmp"),
    };
    temp_path.set_extension(extension);
    temp_path
}

async fn write_temp_file(temp_path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, RecordError, Severity};
    use crate::model::{DatabaseError, ProjectRecord, RecordKind, SchemaRecord};
    use tempfile::TempDir;

    #[test]
    fn temp_path_appends_tmp() {
        assert_eq!(
            make_temp_path(Path::new("/data/db.json")),
            PathBuf::from("/data/db.json.tmp")
        );
        assert_eq!(make_temp_path(Path::new("db")), PathBuf::from("db.tmp"));
    }

    fn sample() -> BranchDatabase {
        let mut project = ProjectRecord::create("App".into(), PathBuf::from("/b/App.csproj"), true);
        project.is_sdk = true;
        project
            .errors
            .push(RecordError::new(Severity::Warning, "odd"));
        let mut database = BranchDatabase::empty();
        database.projects.push(project);
        database.errors.push(DatabaseError {
            kind: RecordKind::Project,
            name: "App".into(),
            path: PathBuf::from("/b/App.csproj"),
            severity: Severity::Warning,
            message: "odd".into(),
            exception: None,
        });
        database
    }

    #[tokio::test]
    async fn save_creates_directory_and_round_trips() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join(".branchmap").join("db.json");
        let database = sample();

        save_database(&path, &database).await.expect("save");

        assert!(path.exists());
        assert!(!make_temp_path(&path).exists(), "temp file should be renamed away");
        let loaded = load_database(&path).await.expect("load");
        assert_eq!(loaded, database);
    }

    #[tokio::test]
    async fn document_uses_pascal_case_keys() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("db.json");

        save_database(&path, &sample()).await.expect("save");

        let text = tokio::fs::read_to_string(&path).await.expect("read");
        for key in [
            "\"GeneratedAt\"",
            "\"Solutions\"",
            "\"Projects\"",
            "\"WixProjects\"",
            "\"Errors\"",
            "\"AssemblyName\"",
            "\"ReferencedBy\"",
        ] {
            assert!(text.contains(key), "missing {key}");
        }
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp_dir = TempDir::new().expect("create temp dir");

        let err = load_database(&temp_dir.path().join("db.json"))
            .await
            .expect_err("should fail");

        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn malformed_file_is_json_error() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("db.json");
        tokio::fs::write(&path, "{ not json").await.expect("write");

        let err = load_database(&path).await.expect_err("should fail");

        assert!(matches!(err, Error::Json(_)));
    }
}
