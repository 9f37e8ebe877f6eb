//! File storage collaborator.
//!
//! Scanning never touches `std::fs` directly; everything goes through the
//! [`FileStorage`] trait so the import pipeline can run against a real
//! branch on disk ([`LocalFileStorage`]) or a canned set of files
//! ([`InMemoryFileStorage`]).
//!
//! Every operation that reads checks the cancellation token first, so a
//! cancelled run stops at the next file boundary.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};

/// Read access to the files of a branch.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Whether a regular file exists at `path`.
    fn file_exists(&self, path: &Path) -> bool;

    /// Read a whole file as text.
    ///
    /// # Errors
    ///
    /// - `Error::Cancelled` if the token was cancelled
    /// - `Error::Io` if the file cannot be read
    async fn read_all_text(&self, path: &Path, cancel: &CancellationToken) -> Result<String>;

    /// List files under `dir` whose names match a `*.ext` style pattern.
    ///
    /// Matching is case-insensitive. Results are sorted.
    ///
    /// # Errors
    ///
    /// - `Error::Cancelled` if the token was cancelled
    /// - `Error::Io` if the directory cannot be read
    async fn get_file_paths(
        &self,
        dir: &Path,
        pattern: &str,
        recursive: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>>;

    /// Names of the immediate subdirectories of `root`, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if `root` cannot be read.
    async fn get_directory_names(&self, root: &Path) -> Result<Vec<String>>;
}

/// Whether a file name matches a simple glob of the form `*suffix`,
/// `prefix*` or an exact name, ignoring ASCII case.
fn matches_pattern(file_name: &str, pattern: &str) -> bool {
    let file_name = file_name.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();
    match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
        (Some(suffix), _) => file_name.ends_with(suffix),
        (None, Some(prefix)) => file_name.starts_with(prefix),
        (None, None) => file_name == pattern,
    }
}

/// Storage backed by the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStorage;

impl LocalFileStorage {
    /// Create local storage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    async fn read_all_text(&self, path: &Path, cancel: &CancellationToken) -> Result<String> {
        cancel.check()?;
        let bytes = tokio::fs::read(path).await?;
        // Legacy build files are often saved with a BOM or in a code page;
        // lossy decoding keeps the ASCII markup the scanners look for.
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    async fn get_file_paths(
        &self,
        dir: &Path,
        pattern: &str,
        recursive: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        cancel.check()?;
        let dir = dir.to_path_buf();
        let pattern = pattern.to_string();
        let max_depth = if recursive { usize::MAX } else { 1 };

        let paths = tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>> {
            let mut paths = Vec::new();
            for entry in WalkDir::new(&dir).max_depth(max_depth) {
                let entry = entry.map_err(|e| {
                    Error::Io(e.into_io_error().unwrap_or_else(|| {
                        std::io::Error::other("directory walk failed")
                    }))
                })?;
                if entry.file_type().is_file()
                    && matches_pattern(&entry.file_name().to_string_lossy(), &pattern)
                {
                    paths.push(entry.into_path());
                }
            }
            paths.sort();
            Ok(paths)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

        debug!(count = paths.len(), "Enumerated files");
        Ok(paths)
    }

    async fn get_directory_names(&self, root: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Storage over an in-memory map of path to file text.
///
/// Directories exist implicitly as ancestors of stored files.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileStorage {
    files: BTreeMap<PathBuf, String>,
}

impl InMemoryFileStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    async fn read_all_text(&self, path: &Path, cancel: &CancellationToken) -> Result<String> {
        cancel.check()?;
        self.files.get(path).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            ))
        })
    }

    async fn get_file_paths(
        &self,
        dir: &Path,
        pattern: &str,
        recursive: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        cancel.check()?;
        Ok(self
            .files
            .keys()
            .filter(|path| {
                if recursive {
                    path.starts_with(dir)
                } else {
                    path.parent() == Some(dir)
                }
            })
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| matches_pattern(&name.to_string_lossy(), pattern))
            })
            .cloned()
            .collect())
    }

    async fn get_directory_names(&self, root: &Path) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(root).ok())
            .filter_map(|rel| {
                let mut components = rel.components();
                let first = components.next()?;
                // only directories: the file itself has no further components
                components
                    .next()
                    .map(|_| first.as_os_str().to_string_lossy().into_owned())
            })
            .collect();
        Ok(names.into_iter().collect())
    }
}
