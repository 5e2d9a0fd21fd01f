//! Harness runs over a fixture set, reported in RON.

use crate::failures::{ExpectedFailures, FailureState, HarnessResult};
use crate::fixture::ScenarioFixture;
use crate::runner::{check_scenario, expectation_refs, run_scenario};
use crate::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessReport {
    pub result: HarnessResult,
    pub fixtures: Vec<FixtureReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureReport {
    pub fixture: String,
    pub title: String,
    /// Final document version.
    pub version: u64,
    pub failures: Vec<ReportedFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedFailure {
    pub expectation: String,
    pub expected: String,
    pub actual: String,
    pub state: FailureState,
}

/// Run and check every fixture, classifying failures against `expected`.
pub fn run_harness(
    fixtures: &[(String, ScenarioFixture)],
    expected: &ExpectedFailures,
) -> SpecResult<HarnessReport> {
    let mut result = HarnessResult::new();
    let mut reports = Vec::with_capacity(fixtures.len());

    for (name, fixture) in fixtures {
        let outcome = run_scenario(fixture)?;
        let failures = check_scenario(fixture, &outcome);
        for expectation in expectation_refs(fixture) {
            match failures.iter().find(|f| f.expectation == expectation) {
                Some(_) => result.record_failure(expected.is_expected(name, &expectation)),
                None => result.record_pass(),
            }
        }

        let failures: Vec<ReportedFailure> = failures
            .into_iter()
            .map(|f| ReportedFailure {
                state: expected.is_expected(name, &f.expectation),
                expectation: f.expectation,
                expected: f.expected,
                actual: f.actual,
            })
            .collect();
        for failure in &failures {
            if failure.state == FailureState::Regression {
                tracing::warn!(
                    fixture = %name,
                    expectation = %failure.expectation,
                    expected = %failure.expected,
                    actual = %failure.actual,
                    "regression"
                );
            }
        }
        reports.push(FixtureReport {
            fixture: name.clone(),
            title: fixture.title.clone(),
            version: outcome.version,
            failures,
        });
    }

    tracing::info!(
        total = result.total,
        passed = result.passed,
        regressions = result.regressions,
        "harness finished"
    );
    Ok(HarnessReport {
        result,
        fixtures: reports,
    })
}

impl HarnessReport {
    /// Every failure not listed as expected.
    pub fn regressions(&self) -> Vec<(&str, &ReportedFailure)> {
        self.fixtures
            .iter()
            .flat_map(|report| {
                report
                    .failures
                    .iter()
                    .filter(|f| f.state == FailureState::Regression)
                    .map(move |f| (report.fixture.as_str(), f))
            })
            .collect()
    }

    pub fn to_ron_string(&self) -> SpecResult<String> {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(6)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        ron::ser::to_string_pretty(self, config).map_err(|e| SpecError::Report {
            message: e.to_string(),
        })
    }

    pub fn from_ron_string(s: &str) -> SpecResult<Self> {
        ron::from_str(s).map_err(|e: ron::error::SpannedError| SpecError::Report {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failures::FailureEntry;

    fn scenario() -> ScenarioFixture {
        ScenarioFixture::from_toml(
            r#"
title = "Two expectations"

[[blocks]]
speaker = "Mari"
words = [{ text = "testt", at = 0, id = "w1" }]

[[steps]]
action = "propose"
original = "testt"
corrected = "test"

[expect]
text = "test"
pending = 1
"#,
            "two.toml",
        )
        .unwrap()
    }

    #[test]
    fn test_failures_are_classified() {
        let fixtures = vec![("two.toml".to_string(), scenario())];
        let report = run_harness(&fixtures, &ExpectedFailures::default()).unwrap();
        assert_eq!(report.result.total, 3);
        assert_eq!(report.result.passed, 2);
        assert_eq!(report.result.regressions, 1);
        let regressions = report.regressions();
        assert_eq!(regressions.len(), 1);
        assert_eq!(regressions[0].0, "two.toml");
        assert_eq!(regressions[0].1.expectation, "text");
        assert_eq!(regressions[0].1.actual, "testt");

        let expected = ExpectedFailures {
            known: vec![],
            pending: vec![FailureEntry {
                fixture: "two.toml".into(),
                expectation: "text".into(),
                reason: Some("suggestions are not accepted".into()),
                added: None,
                issue: None,
            }],
        };
        let report = run_harness(&fixtures, &expected).unwrap();
        assert!(report.result.success());
        assert_eq!(report.result.expected_failures, 1);
        assert_eq!(report.fixtures[0].failures[0].state, FailureState::Pending);
    }

    #[test]
    fn test_ron_round_trip() {
        let fixtures = vec![("two.toml".to_string(), scenario())];
        let report = run_harness(&fixtures, &ExpectedFailures::default()).unwrap();
        let ron = report.to_ron_string().unwrap();
        assert!(ron.contains("state: Regression"));
        assert_eq!(HarnessReport::from_ron_string(&ron).unwrap(), report);
        assert!(matches!(
            HarnessReport::from_ron_string("(result: 1)"),
            Err(SpecError::Report { .. })
        ));
    }
}
