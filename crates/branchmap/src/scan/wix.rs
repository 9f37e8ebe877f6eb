//! `.wixproj` scanner.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::project::{PROJECT_REFERENCE, SDK_ATTRIBUTE};
use crate::paths::{has_extension, resolve_declared};

static COMPILE_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<Compile\s+Include\s*=\s*"([^"]+)""#).expect("valid compile regex")
});

/// Where a wix project's `.wxs` sources come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WxsSources {
    /// SDK-style: every `*.wxs` under this directory, recursively.
    Directory(PathBuf),
    /// Legacy: the `<Compile Include>` items, in file order.
    Explicit(Vec<PathBuf>),
}

/// Result of scanning one wix project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WixProjectScan {
    /// `<Project Sdk="WixToolset.Sdk/...">`
    pub is_sdk: bool,
    /// No `packages.config` beside the project
    pub is_package_ref: bool,
    /// Declared `<ProjectReference>` paths, normalized
    pub project_references: Vec<PathBuf>,
    /// Component sources to harvest
    pub sources: WxsSources,
}

/// Scan a wix project file.
#[must_use]
pub fn scan_wix_project(
    wix_project_path: &Path,
    text: &str,
    has_packages_config: bool,
) -> WixProjectScan {
    let dir = wix_project_path.parent().unwrap_or(Path::new(""));
    let is_sdk = SDK_ATTRIBUTE.is_match(text);

    let mut project_references = Vec::new();
    for caps in PROJECT_REFERENCE.captures_iter(text) {
        let path = resolve_declared(dir, &caps[1]);
        if !project_references.contains(&path) {
            project_references.push(path);
        }
    }

    let sources = if is_sdk {
        WxsSources::Directory(dir.to_path_buf())
    } else {
        let mut files = Vec::new();
        for caps in COMPILE_INCLUDE.captures_iter(text) {
            let path = resolve_declared(dir, &caps[1]);
            if has_extension(&path, "wxs") && !files.contains(&path) {
                files.push(path);
            }
        }
        WxsSources::Explicit(files)
    };

    WixProjectScan {
        is_sdk,
        is_package_ref: !has_packages_config,
        project_references,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_wix_project_lists_compile_items() {
        let text = r#"<Project ToolsVersion="4.0" DefaultTargets="Build">
  <ItemGroup>
    <Compile Include="Product.wxs" />
    <Compile Include="Fragments\Files.wxs" />
    <Compile Include="Helpers.cs" />
  </ItemGroup>
  <ItemGroup>
    <ProjectReference Include="..\App\App.csproj">
      <Name>App</Name>
    </ProjectReference>
  </ItemGroup>
</Project>"#;

        let scan = scan_wix_project(Path::new("/repo/Setup/Setup.wixproj"), text, true);

        assert!(!scan.is_sdk);
        assert!(!scan.is_package_ref);
        assert_eq!(
            scan.project_references,
            vec![PathBuf::from("/repo/App/App.csproj")]
        );
        assert_eq!(
            scan.sources,
            WxsSources::Explicit(vec![
                PathBuf::from("/repo/Setup/Product.wxs"),
                PathBuf::from("/repo/Setup/Fragments/Files.wxs"),
            ])
        );
    }

    #[test]
    fn sdk_wix_project_globs_its_directory() {
        let text = r#"<Project Sdk="WixToolset.Sdk/4.0.3"></Project>"#;

        let scan = scan_wix_project(Path::new("/repo/Setup/Setup.wixproj"), text, false);

        assert!(scan.is_sdk);
        assert!(scan.is_package_ref);
        assert!(scan.project_references.is_empty());
        assert_eq!(
            scan.sources,
            WxsSources::Directory(PathBuf::from("/repo/Setup"))
        );
    }
}
