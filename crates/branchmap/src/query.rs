//! Record filters for listings and closure walks.

use serde::{Deserialize, Serialize};

use crate::model::SchemaRecord;

/// Which records pass on required status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredFilter {
    /// No filtering
    #[default]
    All,
    /// Only records reached from a build definition
    OnlyRequired,
    /// Only records no build definition reaches
    OnlyNonRequired,
}

impl RequiredFilter {
    fn admits(self, is_required: bool) -> bool {
        match self {
            Self::All => true,
            Self::OnlyRequired => is_required,
            Self::OnlyNonRequired => !is_required,
        }
    }
}

/// Filter and traversal options for context queries.
///
/// The default query admits every record and does not recurse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    /// Required-status filter
    pub required: RequiredFilter,
    /// Drop test projects
    pub exclude_tests: bool,
    /// Case-insensitive substring that names must contain
    pub search: Option<String>,
    /// Follow references transitively
    pub recursive: bool,
}

impl ItemQuery {
    /// The default query: everything, one hop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Same filters, transitive.
    #[must_use]
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Restrict by required status.
    #[must_use]
    pub fn with_required(mut self, required: RequiredFilter) -> Self {
        self.required = required;
        self
    }

    /// Drop test projects.
    #[must_use]
    pub fn excluding_tests(mut self) -> Self {
        self.exclude_tests = true;
        self
    }

    /// Keep names containing `text`, ignoring case. Blank text clears the
    /// search.
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = (!text.trim().is_empty()).then_some(text);
        self
    }

    /// Whether `record` passes every filter.
    pub fn is_active<R: SchemaRecord>(&self, record: &R) -> bool {
        if !self.required.admits(record.is_required()) {
            return false;
        }
        if self.exclude_tests && record.is_test() {
            return false;
        }
        match &self.search {
            Some(text) => record
                .name()
                .to_lowercase()
                .contains(&text.trim().to_lowercase()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProjectRecord, SolutionRecord};
    use rstest::rstest;
    use std::path::PathBuf;

    fn project(name: &str, required: bool, test: bool) -> ProjectRecord {
        let mut record = ProjectRecord::create(name.into(), PathBuf::from(format!("/{name}.csproj")), true);
        record.is_required = required;
        record.is_test_project = test;
        record
    }

    #[rstest]
    #[case::all(ItemQuery::new(), true, true, true)]
    #[case::only_required(ItemQuery::new().with_required(RequiredFilter::OnlyRequired), true, false, true)]
    #[case::only_non_required(ItemQuery::new().with_required(RequiredFilter::OnlyNonRequired), false, true, false)]
    #[case::exclude_tests(ItemQuery::new().excluding_tests(), true, true, false)]
    fn filters(
        #[case] query: ItemQuery,
        #[case] required_lib: bool,
        #[case] optional_lib: bool,
        #[case] required_tests: bool,
    ) {
        assert_eq!(query.is_active(&project("Core", true, false)), required_lib);
        assert_eq!(query.is_active(&project("Legacy", false, false)), optional_lib);
        assert_eq!(query.is_active(&project("Core.Tests", true, true)), required_tests);
    }

    #[rstest]
    #[case::substring("ore", true)]
    #[case::case_insensitive("CORE", true)]
    #[case::padded(" core ", true)]
    #[case::miss("legacy", false)]
    fn search_is_case_insensitive_containment(#[case] text: &str, #[case] expected: bool) {
        let query = ItemQuery::new().with_search(text);
        assert_eq!(query.is_active(&project("Contoso.Core", false, false)), expected);
    }

    #[test]
    fn blank_search_matches_everything() {
        let query = ItemQuery::new().with_search("   ");
        assert!(query.search.is_none());
        assert!(query.is_active(&project("Anything", false, false)));
    }

    #[test]
    fn solutions_are_never_tests() {
        let solution = SolutionRecord::create("Tests".into(), PathBuf::from("/Tests.sln"), true);
        assert!(ItemQuery::new().excluding_tests().is_active(&solution));
    }
}
