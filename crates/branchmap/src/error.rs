//! Error types for branchmap operations.
//!
//! Errors are split into two families:
//!
//! - **`Error`**: failures returned from library calls (I/O on the database
//!   file, malformed configuration, cancellation).
//! - **`RecordError`**: diagnostics attached to a single solution, project or
//!   wix project while a branch is scanned. These never stop a scan.
//!
//! ## Error Philosophy
//!
//! Scanning is best effort:
//! - A single malformed file degrades one record, never the whole graph
//! - Missing files become placeholders, not errors
//! - Only cancellation escapes an import handler

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for branchmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for branchmap operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The database snapshot could not be serialized or parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A file could not be interpreted
    #[error("scan error: {0}")]
    Scan(String),

    /// The run was cancelled between file operations
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this error is a cooperative cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// How much attention a record diagnostic needs.
///
/// Ordered so that `Warning < Error < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Content anomaly; the record is still complete.
    Warning,
    /// The record is known to be missing information.
    Error,
    /// Scanning the file failed part way; the record is partially filled.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(Error::Config(format!("unknown severity: {other}"))),
        }
    }
}

/// Diagnostic attached to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordError {
    /// Severity of the diagnostic
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Rendered underlying error, if one triggered the diagnostic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl RecordError {
    /// Create a new diagnostic.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            exception: None,
        }
    }

    /// Attach the rendered cause chain of an underlying error.
    #[must_use]
    pub fn with_exception(mut self, error: &(dyn std::error::Error + 'static)) -> Self {
        self.exception = Some(render_chain(error));
        self
    }
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(exception) = &self.exception {
            write!(f, " ({exception})")?;
        }
        Ok(())
    }
}

/// Render an error and its sources as `outer: inner: root`.
///
/// A source whose text the rendering already ends with (`I/O error: {0}`
/// style messages) is not repeated.
fn render_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_warning_below_critical() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("WARNING".parse::<Severity>().ok(), Some(Severity::Warning));
        assert_eq!("critical".parse::<Severity>().ok(), Some(Severity::Critical));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn record_error_captures_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::Io(io);
        let record = RecordError::new(Severity::Critical, "scan failed").with_exception(&err);

        assert_eq!(record.exception.as_deref(), Some("I/O error: gone"));
        assert_eq!(record.to_string(), "[critical] scan failed (I/O error: gone)");
    }

    #[test]
    fn record_error_appends_sources_missing_from_the_message() {
        #[derive(Debug, thiserror::Error)]
        #[error("loading failed")]
        struct Loading(#[source] Error);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Loading(Error::Io(io));
        let record = RecordError::new(Severity::Error, "load").with_exception(&err);

        assert_eq!(
            record.exception.as_deref(),
            Some("loading failed: I/O error: gone")
        );
    }
}
