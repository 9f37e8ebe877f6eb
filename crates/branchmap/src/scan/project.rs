//! `.csproj` / `.dbproj` / `.sqlproj` scanner.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::paths::{base_name, resolve_declared};

pub(super) static SDK_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<Project\b[^>]*\bSdk\s*=").expect("valid sdk regex")
});

static ASSEMBLY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<AssemblyName>\s*([^<]*?)\s*</AssemblyName>").expect("valid assembly regex")
});

static TARGET_FRAMEWORKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<TargetFrameworks?>([^<]*)</TargetFrameworks?>")
        .expect("valid target framework regex")
});

pub(super) static PROJECT_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<ProjectReference\s+Include\s*=\s*"([^"]+)""#)
        .expect("valid project reference regex")
});

static IS_TEST_PROJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<IsTestProject>\s*true\s*</IsTestProject>").expect("valid test flag regex")
});

static TEST_FRAMEWORK_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<(?:PackageReference|Reference)\s+Include\s*=\s*"(?:xunit(?:\.core)?|nunit(?:\.framework)?|mstest\.testframework|microsoft\.net\.test\.sdk|microsoft\.visualstudio\.qualitytools\.unittestframework)\s*[",]"#,
    )
    .expect("valid test framework regex")
});

/// Result of scanning one project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScan {
    /// Output assembly name, without extension
    pub assembly_name: String,
    /// `<assembly>.pdb`
    pub pdb_file_name: String,
    /// `<Project Sdk="...">`
    pub is_sdk: bool,
    /// One of the target frameworks is netstandard2.x
    pub is_net_standard2: bool,
    /// No `packages.config` beside the project
    pub is_package_ref: bool,
    /// Declares itself a test project or references a test framework
    pub is_test_project: bool,
    /// Declared `<ProjectReference>` paths, normalized, in file order
    pub project_references: Vec<PathBuf>,
}

/// Scan a project file.
///
/// `has_packages_config` says whether a `packages.config` sits next to the
/// project; package-reference mode is inferred from its absence.
#[must_use]
pub fn scan_project(project_path: &Path, text: &str, has_packages_config: bool) -> ProjectScan {
    let dir = project_path.parent().unwrap_or(Path::new(""));

    let assembly_name = ASSEMBLY_NAME
        .captures(text)
        .map(|caps| caps[1].to_string())
        .filter(|name| !name.is_empty() && !name.contains("$("))
        .unwrap_or_else(|| base_name(project_path));

    let is_net_standard2 = TARGET_FRAMEWORKS.captures_iter(text).any(|caps| {
        caps[1]
            .split(';')
            .map(|tfm| tfm.trim().to_ascii_lowercase())
            .any(|tfm| tfm.starts_with("netstandard2"))
    });

    let mut project_references = Vec::new();
    for caps in PROJECT_REFERENCE.captures_iter(text) {
        let path = resolve_declared(dir, &caps[1]);
        if !project_references.contains(&path) {
            project_references.push(path);
        }
    }

    ProjectScan {
        pdb_file_name: format!("{assembly_name}.pdb"),
        assembly_name,
        is_sdk: SDK_ATTRIBUTE.is_match(text),
        is_net_standard2,
        is_package_ref: !has_packages_config,
        is_test_project: IS_TEST_PROJECT.is_match(text)
            || TEST_FRAMEWORK_REFERENCE.is_match(text),
        project_references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const OLD_STYLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <AssemblyName>Contoso.Billing</AssemblyName>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <ProjectReference Include="..\Common\Common.csproj">
      <Project>{1}</Project>
    </ProjectReference>
    <ProjectReference Include="..\Data\Data.csproj" />
  </ItemGroup>
</Project>"#;

    const SDK_STYLE: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFrameworks>net48;NetStandard2.0</TargetFrameworks>
  </PropertyGroup>
</Project>"#;

    #[test]
    fn old_style_project() {
        let scan = scan_project(Path::new("/repo/Billing/Billing.csproj"), OLD_STYLE, true);

        assert_eq!(scan.assembly_name, "Contoso.Billing");
        assert_eq!(scan.pdb_file_name, "Contoso.Billing.pdb");
        assert!(!scan.is_sdk);
        assert!(!scan.is_net_standard2);
        assert!(!scan.is_package_ref, "packages.config present");
        assert!(!scan.is_test_project);
        assert_eq!(
            scan.project_references,
            vec![
                PathBuf::from("/repo/Common/Common.csproj"),
                PathBuf::from("/repo/Data/Data.csproj"),
            ]
        );
    }

    #[test]
    fn sdk_style_project_falls_back_to_file_name() {
        let scan = scan_project(Path::new("/repo/Core/Core.csproj"), SDK_STYLE, false);

        assert_eq!(scan.assembly_name, "Core");
        assert_eq!(scan.pdb_file_name, "Core.pdb");
        assert!(scan.is_sdk);
        assert!(scan.is_net_standard2);
        assert!(scan.is_package_ref);
        assert!(scan.project_references.is_empty());
    }

    #[test]
    fn msbuild_property_assembly_name_falls_back() {
        let text = "<Project><PropertyGroup><AssemblyName>$(MSBuildProjectName)</AssemblyName></PropertyGroup></Project>";
        let scan = scan_project(Path::new("/r/Tool.csproj"), text, false);
        assert_eq!(scan.assembly_name, "Tool");
    }

    #[rstest]
    #[case::single("<TargetFramework>netstandard2.1</TargetFramework>", true)]
    #[case::multi_upper("<TargetFrameworks>net472; NETSTANDARD2.0 </TargetFrameworks>", true)]
    #[case::netstandard1("<TargetFramework>netstandard1.6</TargetFramework>", false)]
    #[case::net6("<TargetFramework>net6.0</TargetFramework>", false)]
    #[case::none("<PropertyGroup />", false)]
    fn detects_netstandard2(#[case] property: &str, #[case] expected: bool) {
        let text = format!("<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup>{property}</PropertyGroup></Project>");
        let scan = scan_project(Path::new("/r/P.csproj"), &text, false);
        assert_eq!(scan.is_net_standard2, expected);
    }

    #[rstest]
    #[case::flag("<IsTestProject>true</IsTestProject>")]
    #[case::xunit(r#"<PackageReference Include="xunit" Version="2.4.1" />"#)]
    #[case::test_sdk(r#"<PackageReference Include="Microsoft.NET.Test.Sdk" Version="17.0.0" />"#)]
    #[case::nunit_assembly(r#"<Reference Include="nunit.framework, Version=3.12.0.0, Culture=neutral" />"#)]
    #[case::mstest(r#"<PackageReference Include="MSTest.TestFramework" Version="2.2.8" />"#)]
    fn detects_test_projects(#[case] item: &str) {
        let text = format!("<Project><ItemGroup>{item}</ItemGroup></Project>");
        let scan = scan_project(Path::new("/r/P.Tests.csproj"), &text, false);
        assert!(scan.is_test_project, "{item}");
    }

    #[test]
    fn similarly_named_packages_are_not_test_frameworks() {
        let text = r#"<Project><ItemGroup><PackageReference Include="xunit.analyzers.custom" /></ItemGroup></Project>"#;
        let scan = scan_project(Path::new("/r/P.csproj"), text, false);
        assert!(!scan.is_test_project);
    }
}
