//! Path helpers shared by the scanners.
//!
//! Solution and project files declare relative paths with Windows
//! separators (`..\Common\Common.csproj`). Referenced files may not exist, so
//! resolution is purely lexical; nothing here touches the file system
//! beyond reading the current directory in [`absolute`].
//!
//! The files themselves live on case-insensitive file systems, so record
//! identity goes through [`PathKey`] rather than the path as spelled.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Case-folded identity of a build file path.
///
/// `..\lib\Lib.csproj` and `Lib\Lib.csproj` resolved from the same place
/// share a key. The path as first spelled is kept on the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(String);

impl PathKey {
    /// Key for an already normalized path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self(path.to_string_lossy().to_lowercase())
    }
}

impl From<&Path> for PathKey {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

/// Make `path` absolute against the current directory and normalize it.
///
/// # Errors
///
/// Returns an I/O error if the current directory cannot be read.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    Ok(normalize(&std::path::absolute(path)?))
}

/// Resolve a path declared inside a build file against the declaring
/// file's directory.
///
/// Backslashes are treated as separators and `.`/`..` components are
/// folded away. Absolute declarations are normalized but not re-rooted.
#[must_use]
pub fn resolve_declared(base_dir: &Path, declared: &str) -> PathBuf {
    let declared = declared.trim().replace('\\', "/");
    let declared = Path::new(&declared);
    if declared.is_absolute() {
        normalize(declared)
    } else {
        normalize(&base_dir.join(declared))
    }
}

/// Lexically normalize a path, folding `.` and `..` components.
///
/// A `..` that would climb above the root is dropped.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let climbs = matches!(
                    out.components().next_back(),
                    None | Some(Component::ParentDir)
                );
                if !climbs {
                    out.pop();
                } else if !path.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The file name without its extension, used as a record's base name.
#[must_use]
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Case-insensitive extension test (`Foo.CSPROJ` has extension `csproj`).
#[must_use]
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
