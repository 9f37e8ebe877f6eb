//! Pure file scanners.
//!
//! Each scanner takes one file's text plus the file's own path and returns
//! the typed outgoing references and intrinsic properties it found. Nothing
//! here touches the graph or the file system; anything a scanner needs to
//! know about neighbouring files (such as whether `packages.config` exists)
//! is passed in by the caller.
//!
//! The inputs are legacy, loosely specified text formats, so scanning is
//! pattern matching rather than parsing. A scan always completes with
//! whatever it found; anomalies go to the result's diagnostics.

mod component;
mod project;
mod solution;
mod wix;

pub use component::scan_wix_component;
pub use project::{ProjectScan, scan_project};
pub use solution::{
    SolutionProjectEntry, SolutionScan, classify_project_type_guid, scan_solution,
};
pub use wix::{WixProjectScan, WxsSources, scan_wix_project};

/// File name whose presence next to a project marks `packages.config`
/// package management.
pub const PACKAGES_CONFIG: &str = "packages.config";
