//! Expected failures tracking via TOML file.

use crate::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Loaded expected failures configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedFailures {
    /// Known failures (won't fix soon).
    #[serde(default)]
    pub known: Vec<FailureEntry>,
    /// Pending failures (awaiting fix).
    #[serde(default)]
    pub pending: Vec<FailureEntry>,
}

/// A single expected failure entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEntry {
    /// Fixture name relative to the fixtures directory.
    pub fixture: String,
    /// Expectation reference (e.g. "step[2]" or "text").
    pub expectation: String,
    #[serde(default)]
    pub reason: Option<String>,
    /// Date added (YYYY-MM-DD).
    #[serde(default)]
    pub added: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
}

/// Failure lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureState {
    /// Known limitation, won't fix soon.
    Known,
    /// Awaiting fix, not blocking.
    Pending,
    /// Expected to pass; failing is a regression.
    Regression,
}

impl ExpectedFailures {
    /// Load from a TOML file. A missing file means no expected failures.
    pub fn load(path: &Path) -> SpecResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| SpecError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| SpecError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn is_expected(&self, fixture: &str, expectation: &str) -> FailureState {
        if self.find(&self.known, fixture, expectation).is_some() {
            FailureState::Known
        } else if self.find(&self.pending, fixture, expectation).is_some() {
            FailureState::Pending
        } else {
            FailureState::Regression
        }
    }

    /// Every fixture with at least one expected failure, sorted.
    pub fn all_fixtures(&self) -> Vec<&str> {
        let mut fixtures: Vec<_> = self
            .known
            .iter()
            .chain(self.pending.iter())
            .map(|e| e.fixture.as_str())
            .collect();
        fixtures.sort();
        fixtures.dedup();
        fixtures
    }

    pub fn count(&self) -> usize {
        self.known.len() + self.pending.len()
    }

    pub fn get_entry(&self, fixture: &str, expectation: &str) -> Option<&FailureEntry> {
        self.find(&self.known, fixture, expectation)
            .or_else(|| self.find(&self.pending, fixture, expectation))
    }

    fn find<'a>(
        &self,
        entries: &'a [FailureEntry],
        fixture: &str,
        expectation: &str,
    ) -> Option<&'a FailureEntry> {
        entries
            .iter()
            .find(|e| e.fixture == fixture && e.expectation == expectation)
    }
}

/// Result of running the harness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessResult {
    /// Total expectations checked.
    pub total: usize,
    pub passed: usize,
    /// Expected failures (known + pending).
    pub expected_failures: usize,
    /// Unexpected failures.
    pub regressions: usize,
}

impl HarnessResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 when there are no regressions, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.regressions > 0 {
            1
        } else {
            0
        }
    }

    pub fn success(&self) -> bool {
        self.regressions == 0
    }

    pub fn record_pass(&mut self) {
        self.total += 1;
        self.passed += 1;
    }

    pub fn record_failure(&mut self, state: FailureState) {
        self.total += 1;
        match state {
            FailureState::Known | FailureState::Pending => self.expected_failures += 1,
            FailureState::Regression => self.regressions += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn entry(fixture: &str, expectation: &str) -> FailureEntry {
        FailureEntry {
            fixture: fixture.to_string(),
            expectation: expectation.to_string(),
            reason: None,
            added: None,
            issue: None,
        }
    }

    #[test]
    fn test_is_expected() {
        let failures = ExpectedFailures {
            known: vec![entry("a.toml", "text")],
            pending: vec![entry("b.toml", "step[1]")],
        };
        assert_eq!(failures.is_expected("a.toml", "text"), FailureState::Known);
        assert_eq!(failures.is_expected("b.toml", "step[1]"), FailureState::Pending);
        assert_eq!(failures.is_expected("b.toml", "step[2]"), FailureState::Regression);
        assert_eq!(failures.all_fixtures(), vec!["a.toml", "b.toml"]);
        assert_eq!(failures.count(), 2);
        assert!(failures.get_entry("a.toml", "text").is_some());
        assert!(failures.get_entry("a.toml", "pending").is_none());
    }

    #[test]
    fn test_harness_result_record() {
        let mut result = HarnessResult::new();
        result.record_pass();
        result.record_failure(FailureState::Pending);
        assert!(result.success());
        assert_eq!(result.exit_code(), 0);

        result.record_failure(FailureState::Regression);
        assert_eq!(
            result,
            HarnessResult {
                total: 3,
                passed: 1,
                expected_failures: 1,
                regressions: 1,
            }
        );
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[known]]
fixture = "review/undo.toml"
expectation = "version"
reason = "undo numbering under discussion"
added = "2026-10-18"

[[pending]]
fixture = "doubled-letter.toml"
expectation = "step[0]"
"#
        )
        .unwrap();

        let failures = ExpectedFailures::load(file.path()).unwrap();
        assert_eq!(failures.known.len(), 1);
        assert_eq!(failures.pending.len(), 1);
        assert_eq!(
            failures.is_expected("review/undo.toml", "version"),
            FailureState::Known
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let failures = ExpectedFailures::load(&dir.path().join("expected-failures.toml")).unwrap();
        assert_eq!(failures.count(), 0);
    }
}
