//! `.sln` scanner.
//!
//! Solution files list projects as
//!
//! ```text
//! Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "App", "App\App.csproj", "{…}"
//! ```
//!
//! The first GUID is the project-type GUID, which tells old-style and
//! SDK-style projects apart.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::model::ProjectType;
use crate::paths::{has_extension, resolve_declared};

static PROJECT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*Project\(\s*"\{(?P<type>[0-9A-Fa-f-]+)\}"\s*\)\s*=\s*"(?P<name>[^"]*)"\s*,\s*"(?P<path>[^"]*)""#,
    )
    .expect("valid solution project regex")
});

/// Project-type GUIDs by format. Anything not listed is `Unknown`.
const PROJECT_TYPE_GUIDS: &[(&str, ProjectType)] = &[
    // C#
    ("FAE04EC0-301F-11D3-BF4B-00C04F79EFBC", ProjectType::OldStyle),
    ("9A19103F-16F7-4668-BE54-9A1E7A4F7556", ProjectType::SdkStyle),
    // VB.NET
    ("F184B08F-C81C-45F6-A57F-5ABD9991F28F", ProjectType::OldStyle),
    ("778DAE3C-4631-46EA-AA77-85C1314464D9", ProjectType::SdkStyle),
    // F#
    ("F2A71F9B-5D33-465A-A702-920D77279786", ProjectType::OldStyle),
    ("6EC3EE1D-3C4E-46DD-8F32-0CC8E7565705", ProjectType::SdkStyle),
    // Database projects
    ("C8D11400-126E-41CD-887F-60BD40844F9E", ProjectType::OldStyle),
    ("00D1A9C2-B5F0-4AF3-8072-F6C62B433612", ProjectType::OldStyle),
];

/// Extensions routed to the general project list.
const PROJECT_EXTENSIONS: &[&str] = &["csproj", "dbproj", "sqlproj"];

/// Extension routed to the wix project list.
const WIX_PROJECT_EXTENSION: &str = "wixproj";

/// A project declared by a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionProjectEntry {
    /// Normalized absolute path of the project file
    pub path: PathBuf,
    /// Format according to the type GUID
    pub project_type: ProjectType,
}

/// Result of scanning one solution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionScan {
    /// `.csproj`/`.dbproj`/`.sqlproj` entries, in file order
    pub projects: Vec<SolutionProjectEntry>,
    /// `.wixproj` paths, in file order
    pub wix_projects: Vec<PathBuf>,
    /// Anomalies found while scanning
    pub errors: Vec<String>,
}

/// Map a project-type GUID (with or without braces, any case) to a format.
#[must_use]
pub fn classify_project_type_guid(guid: &str) -> ProjectType {
    let guid = guid.trim().trim_start_matches('{').trim_end_matches('}');
    PROJECT_TYPE_GUIDS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(guid))
        .map_or(ProjectType::Unknown, |(_, project_type)| *project_type)
}

/// Scan a solution file.
///
/// Declared paths are resolved against `solution_path`'s directory. Entries
/// with other extensions (solution folders, `.vbproj`, web sites) are
/// ignored. An unknown type GUID on a routed project is reported in
/// [`SolutionScan::errors`] and the entry is kept as `Unknown`.
#[must_use]
pub fn scan_solution(solution_path: &Path, text: &str) -> SolutionScan {
    let dir = solution_path.parent().unwrap_or(Path::new(""));
    let mut scan = SolutionScan::default();

    for caps in PROJECT_LINE.captures_iter(text) {
        let declared = &caps["path"];
        let path = resolve_declared(dir, declared);

        if has_extension(&path, WIX_PROJECT_EXTENSION) {
            if !scan.wix_projects.contains(&path) {
                scan.wix_projects.push(path);
            }
            continue;
        }

        if !PROJECT_EXTENSIONS.iter().any(|ext| has_extension(&path, ext)) {
            continue;
        }

        let guid = &caps["type"];
        let project_type = classify_project_type_guid(guid);
        if project_type == ProjectType::Unknown {
            scan.errors.push(format!(
                "Unknown project type GUID {{{guid}}} for project \"{}\" ({declared})",
                &caps["name"]
            ));
        }

        if scan.projects.iter().all(|entry| entry.path != path) {
            scan.projects.push(SolutionProjectEntry { path, project_type });
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SOLUTION: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
# Visual Studio Version 17
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Legacy", "Legacy\Legacy.csproj", "{11111111-1111-1111-1111-111111111111}"
EndProject
Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "Modern", "..\Shared\Modern\Modern.csproj", "{22222222-2222-2222-2222-222222222222}"
EndProject
Project("{2150E333-8FDC-42A3-9474-1A3956D46DE8}") = "Solution Items", "Solution Items", "{33333333-3333-3333-3333-333333333333}"
EndProject
Project("{930C7802-8A8C-48F9-8165-68863BCCD9DD}") = "Setup", "Setup\Setup.wixproj", "{44444444-4444-4444-4444-444444444444}"
EndProject
Project("{00D1A9C2-B5F0-4AF3-8072-F6C62B433612}") = "Db", "Db\Db.sqlproj", "{55555555-5555-5555-5555-555555555555}"
EndProject
Project("{F184B08F-C81C-45F6-A57F-5ABD9991F28F}") = "Vb", "Vb\Vb.vbproj", "{66666666-6666-6666-6666-666666666666}"
EndProject
Global
EndGlobal
"#;

    #[test]
    fn routes_projects_and_wix_projects() {
        let scan = scan_solution(Path::new("/repo/Main/App.sln"), SOLUTION);

        assert_eq!(
            scan.projects,
            vec![
                SolutionProjectEntry {
                    path: PathBuf::from("/repo/Main/Legacy/Legacy.csproj"),
                    project_type: ProjectType::OldStyle,
                },
                SolutionProjectEntry {
                    path: PathBuf::from("/repo/Shared/Modern/Modern.csproj"),
                    project_type: ProjectType::SdkStyle,
                },
                SolutionProjectEntry {
                    path: PathBuf::from("/repo/Main/Db/Db.sqlproj"),
                    project_type: ProjectType::OldStyle,
                },
            ]
        );
        assert_eq!(
            scan.wix_projects,
            vec![PathBuf::from("/repo/Main/Setup/Setup.wixproj")]
        );
        assert!(scan.errors.is_empty(), "unexpected: {:?}", scan.errors);
    }

    #[test]
    fn unknown_guid_is_reported_not_fatal() {
        let text = r#"Project("{DEADBEEF-0000-0000-0000-000000000000}") = "Odd", "Odd\Odd.csproj", "{1}"
EndProject
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Fine", "Fine\Fine.csproj", "{2}"
EndProject"#;

        let scan = scan_solution(Path::new("/s/X.sln"), text);

        assert_eq!(scan.projects.len(), 2);
        assert_eq!(scan.projects[0].project_type, ProjectType::Unknown);
        assert_eq!(scan.projects[1].project_type, ProjectType::OldStyle);
        assert_eq!(scan.errors.len(), 1);
        assert!(scan.errors[0].contains("DEADBEEF"));
    }

    #[test]
    fn empty_or_garbage_text_yields_nothing() {
        assert_eq!(scan_solution(Path::new("/s/X.sln"), ""), SolutionScan::default());
        assert_eq!(
            scan_solution(Path::new("/s/X.sln"), "Project(\"{broken"),
            SolutionScan::default()
        );
    }

    #[test]
    fn duplicate_entries_are_listed_once() {
        let line = "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"A\", \"A\\A.csproj\", \"{1}\"\n";
        let scan = scan_solution(Path::new("/s/X.sln"), &line.repeat(2));
        assert_eq!(scan.projects.len(), 1);
    }

    #[rstest]
    #[case::csharp_classic("FAE04EC0-301F-11D3-BF4B-00C04F79EFBC", ProjectType::OldStyle)]
    #[case::csharp_sdk("9A19103F-16F7-4668-BE54-9A1E7A4F7556", ProjectType::SdkStyle)]
    #[case::lowercase_braced("{9a19103f-16f7-4668-be54-9a1e7a4f7556}", ProjectType::SdkStyle)]
    #[case::sql("00D1A9C2-B5F0-4AF3-8072-F6C62B433612", ProjectType::OldStyle)]
    #[case::unknown("00000000-0000-0000-0000-000000000000", ProjectType::Unknown)]
    fn classifies_type_guids(#[case] guid: &str, #[case] expected: ProjectType) {
        assert_eq!(classify_project_type_guid(guid), expected);
    }
}
