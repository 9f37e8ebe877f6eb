//! Shared fixtures for branchmap integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use branchmap::{
    BranchDatabase, BuildDefinition, CancellationToken, ImportOptions, LocalFileStorage,
    import_branch,
};
use tempfile::TempDir;

pub const CSHARP_SDK_GUID: &str = "9A19103F-16F7-4668-BE54-9A1E7A4F7556";
pub const CSHARP_LEGACY_GUID: &str = "FAE04EC0-301F-11D3-BF4B-00C04F79EFBC";
pub const WIX_GUID: &str = "930C7802-8A8C-48F9-8165-68863BCCD9DD";

/// Create a temporary branch with the given files.
pub fn branch_with_files(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("should create temp dir");

    for (path, content) in files {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("should create parent dirs");
        }
        fs::write(&full_path, content).expect("should write file");
    }

    dir
}

/// Solution text listing `(type guid, relative path)` entries.
pub fn solution(entries: &[(&str, &str)]) -> String {
    let mut text = String::from(
        "\u{feff}\r\nMicrosoft Visual Studio Solution File, Format Version 12.00\r\n# Visual Studio Version 17\r\n",
    );
    for (index, (guid, path)) in entries.iter().enumerate() {
        let name = Path::new(&path.replace('\\', "/"))
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        text.push_str(&format!(
            "Project(\"{{{guid}}}\") = \"{name}\", \"{path}\", \"{{00000000-0000-0000-0000-{index:012}}}\"\r\nEndProject\r\n"
        ));
    }
    text.push_str("Global\r\nEndGlobal\r\n");
    text
}

/// SDK-style project text with the given `<ProjectReference>` includes.
pub fn sdk_project(references: &[&str]) -> String {
    let items: String = references
        .iter()
        .map(|r| format!("    <ProjectReference Include=\"{r}\" />\n"))
        .collect();
    format!(
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <TargetFramework>net8.0</TargetFramework>\n  </PropertyGroup>\n  <ItemGroup>\n{items}  </ItemGroup>\n</Project>\n"
    )
}

/// Import a branch from disk.
pub async fn import(
    dir: &TempDir,
    builds: &[(&str, &str)],
    include_all_solutions: bool,
) -> BranchDatabase {
    let options = ImportOptions {
        build_definitions: builds
            .iter()
            .map(|(name, solution)| BuildDefinition::new(*name, *solution))
            .collect(),
        include_all_solutions,
    };
    import_branch(
        Arc::new(LocalFileStorage::new()),
        dir.path(),
        &options,
        CancellationToken::new(),
    )
    .await
    .expect("import should succeed")
    .database
}
