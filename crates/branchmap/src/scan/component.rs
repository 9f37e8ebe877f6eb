//! `.wxs` component scanner.
//!
//! Installers harvest assemblies by pointing a `File` element at a
//! preprocessor variable, e.g.
//! `<File Id="App" Source="$(var.App.TargetDir)\App.dll" />`.

use std::sync::LazyLock;

use regex::Regex;

static HARVESTED_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<File\b[^>]*?\bSource\s*=\s*"(\$\(var\.[^"]*?\.dll)""#)
        .expect("valid harvested file regex")
});

/// Extract harvested assembly file names (`App.dll`) from a `.wxs` file.
///
/// Path prefixes (variables and directories) are stripped. Names are
/// returned in file order; repeats within one file are kept so the caller
/// can report duplicate harvesting.
#[must_use]
pub fn scan_wix_component(text: &str) -> Vec<String> {
    HARVESTED_FILE
        .captures_iter(text)
        .filter_map(|caps| {
            let source = &caps[1];
            let file_name = source
                .rsplit(['\\', '/', ')'])
                .next()
                .unwrap_or(source)
                .trim();
            (!file_name.is_empty()).then(|| file_name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_dll_names_without_prefix() {
        let text = r#"<Wix>
  <Component Id="Core">
    <File Id="App" Source="$(var.App.TargetDir)\App.dll" KeyPath="yes" />
    <File Id="Lib" Source="$(var.Lib.TargetDir)bin/Release/Contoso.Lib.dll" />
    <File Id="Cfg" Source="$(var.App.TargetDir)\App.dll.config" />
    <File Id="Doc" Source="docs\readme.txt" />
    <File Id="Plain" Source="C:\drop\Other.dll" />
  </Component>
</Wix>"#;

        assert_eq!(scan_wix_component(text), vec!["App.dll", "Contoso.Lib.dll"]);
    }

    #[test]
    fn variable_directly_before_name() {
        let text = r#"<File Source="$(var.OutDir)Tool.dll"/>"#;
        assert_eq!(scan_wix_component(text), vec!["Tool.dll"]);
    }

    #[test]
    fn keeps_repeats_for_duplicate_detection() {
        let text = r#"<File Source="$(var.A.TargetDir)\A.dll"/><File Source="$(var.A.TargetDir)\A.dll"/>"#;
        assert_eq!(scan_wix_component(text), vec!["A.dll", "A.dll"]);
    }

    #[test]
    fn no_files_yields_empty() {
        assert!(scan_wix_component("<Wix><Fragment /></Wix>").is_empty());
    }
}
