//! Scanning a branch given as a relative path.
//!
//! Changes the process working directory, so it lives alone in this test
//! binary.

mod common;

use std::path::Path;
use std::sync::Arc;

use branchmap::{
    BuildDefinition, CancellationToken, ImportOptions, LocalFileStorage, import_branch,
};
use common::{CSHARP_SDK_GUID, branch_with_files, sdk_project, solution};

#[tokio::test]
async fn relative_root_yields_one_absolute_record_per_file() {
    let dir = branch_with_files(&[
        ("main/App.sln", &solution(&[(CSHARP_SDK_GUID, r"App\App.csproj")])),
        ("main/App/App.csproj", &sdk_project(&[])),
    ]);
    std::env::set_current_dir(dir.path()).expect("enter temp dir");
    let cwd = std::env::current_dir().expect("cwd");

    let options = ImportOptions {
        build_definitions: vec![BuildDefinition::new("CI", "App.sln")],
        include_all_solutions: true,
    };
    let db = import_branch(
        Arc::new(LocalFileStorage::new()),
        Path::new("./main"),
        &options,
        CancellationToken::new(),
    )
    .await
    .expect("import should succeed")
    .database;

    assert_eq!(db.solutions.len(), 1, "{:?}", db.solutions);
    let sln = &db.solutions[0];
    assert_eq!(sln.name, "App");
    assert!(sln.is_required);
    assert_eq!(sln.path, cwd.join("main").join("App.sln"));

    assert_eq!(db.projects.len(), 1);
    assert!(db.projects[0].path.is_absolute());
    assert_eq!(db.projects[0].path, cwd.join("main").join("App").join("App.csproj"));
}
