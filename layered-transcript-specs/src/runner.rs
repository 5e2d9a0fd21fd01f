//! Scenario execution and expectation checking.

use crate::fixture::{ScenarioFixture, StepFixture};
use crate::SpecResult;
use layered_transcript::{DocumentDisplay, Scope, SuggestionId};
use layered_transcript_review::{CorrectionRequest, Session};
use serde::{Deserialize, Serialize};

/// What one step did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub action: String,
    /// Error kind when the step failed.
    pub error: Option<String>,
    /// Suggestions the step created or resolved.
    pub suggestions: Vec<String>,
    /// Document version after the step.
    pub version: u64,
}

/// End state of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub title: String,
    pub steps: Vec<StepOutcome>,
    pub text: String,
    pub display: String,
    pub pending: usize,
    pub identifiers: Vec<String>,
    pub version: u64,
}

/// An expectation that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationFailure {
    /// "step[i]", "text", "display", "pending", "identifiers" or "version".
    pub expectation: String,
    pub expected: String,
    pub actual: String,
}

/// Run every step of `fixture` against a fresh session.
///
/// Failing steps are recorded, not fatal; only an invalid starting document
/// is an error.
pub fn run_scenario(fixture: &ScenarioFixture) -> SpecResult<ScenarioOutcome> {
    let mut session = Session::with_config(fixture.document()?, fixture.config.clone());
    let mut steps = Vec::with_capacity(fixture.steps.len());

    for (index, step) in fixture.steps.iter().enumerate() {
        let result = run_step(&mut session, step);
        if let Err(kind) = &result {
            tracing::debug!(title = %fixture.title, index, kind = %kind, "step failed");
        }
        let (suggestions, error) = match result {
            Ok(ids) => (ids.iter().map(ToString::to_string).collect(), None),
            Err(kind) => (Vec::new(), Some(kind)),
        };
        steps.push(StepOutcome {
            action: step.action().to_string(),
            error,
            suggestions,
            version: session.version(),
        });
    }

    let doc = session.document();
    Ok(ScenarioOutcome {
        title: fixture.title.clone(),
        steps,
        text: doc.plain_text(),
        display: DocumentDisplay::new(doc).to_string(),
        pending: session.pending().len(),
        identifiers: doc
            .blocks()
            .iter()
            .flat_map(|block| block.words())
            .map(|word| word.identifier().to_string())
            .collect(),
        version: session.version(),
    })
}

fn run_step(session: &mut Session, step: &StepFixture) -> Result<Vec<SuggestionId>, String> {
    match step {
        StepFixture::Propose {
            original,
            corrected,
            reason,
            block,
            occurrence,
            ..
        } => {
            let mut request = CorrectionRequest::new(original.clone(), corrected.clone())
                .with_reason(reason.clone());
            if let Some(block) = block {
                request = request.with_scope(Scope::Block(*block));
            }
            if let Some(occurrence) = occurrence {
                request = request.with_occurrence(*occurrence);
            }
            session
                .propose(&request)
                .map(|applied| applied.suggestions)
                .map_err(|e| e.kind().to_string())
        }
        StepFixture::Accept { id, .. } => {
            let id = SuggestionId::from(id.as_str());
            session
                .accept(&id)
                .map(|_| vec![id])
                .map_err(|e| e.kind().to_string())
        }
        StepFixture::Reject { id, .. } => {
            let id = SuggestionId::from(id.as_str());
            session
                .reject(&id)
                .map(|_| vec![id])
                .map_err(|e| e.kind().to_string())
        }
        StepFixture::AcceptAll => session.accept_all().map_err(|e| e.kind().to_string()),
        StepFixture::RejectAll => session.reject_all().map_err(|e| e.kind().to_string()),
        StepFixture::Rename {
            block,
            name,
            speaker_id,
            ..
        } => session
            .rename_speaker(*block, name.clone(), speaker_id.clone())
            .map(|_| Vec::new())
            .map_err(|_| "invalid_block".to_string()),
        StepFixture::Undo { .. } => session
            .undo()
            .map(|_| Vec::new())
            .ok_or_else(|| "nothing_to_undo".to_string()),
    }
}

/// References of every expectation `fixture` declares, in check order.
pub fn expectation_refs(fixture: &ScenarioFixture) -> Vec<String> {
    let mut refs: Vec<String> = (0..fixture.steps.len())
        .map(|index| format!("step[{}]", index))
        .collect();
    let expect = &fixture.expect;
    let declared = [
        ("text", expect.text.is_some()),
        ("display", expect.display.is_some()),
        ("pending", expect.pending.is_some()),
        ("identifiers", expect.identifiers.is_some()),
        ("version", expect.version.is_some()),
    ];
    refs.extend(
        declared
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| name.to_string()),
    );
    refs
}

/// Compare a run against the fixture's expectations.
pub fn check_scenario(fixture: &ScenarioFixture, outcome: &ScenarioOutcome) -> Vec<ExpectationFailure> {
    let mut failures = Vec::new();
    let mut check = |expectation: String, expected: String, actual: String| {
        if expected != actual {
            failures.push(ExpectationFailure {
                expectation,
                expected,
                actual,
            });
        }
    };

    let describe = |error: Option<&str>| match error {
        Some(kind) => format!("error {}", kind),
        None => "ok".to_string(),
    };
    for (index, (step, result)) in fixture.steps.iter().zip(&outcome.steps).enumerate() {
        check(
            format!("step[{}]", index),
            describe(step.expected_error()),
            describe(result.error.as_deref()),
        );
    }

    let expect = &fixture.expect;
    if let Some(text) = &expect.text {
        check("text".into(), text.clone(), outcome.text.clone());
    }
    if let Some(display) = &expect.display {
        check("display".into(), display.clone(), outcome.display.clone());
    }
    if let Some(pending) = expect.pending {
        check("pending".into(), pending.to_string(), outcome.pending.to_string());
    }
    if let Some(identifiers) = &expect.identifiers {
        check(
            "identifiers".into(),
            identifiers.join(" "),
            outcome.identifiers.join(" "),
        );
    }
    if let Some(version) = expect.version {
        check("version".into(), version.to_string(), outcome.version.to_string());
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(steps: &str, expect: &str) -> ScenarioFixture {
        let content = format!(
            r#"
title = "inline"

[[blocks]]
speaker = "Mari"
words = [
    {{ text = "See", at = 0.0, id = "w1" }},
    {{ text = "on", at = 0.4, id = "w2" }},
    {{ text = "testt", at = 0.8, id = "w42" }},
]
{}
[expect]
{}
"#,
            steps, expect
        );
        ScenarioFixture::from_toml(&content, "inline.toml").unwrap()
    }

    #[test]
    fn test_run_records_each_step() {
        let fixture = fixture(
            r#"
[[steps]]
action = "propose"
original = "testt"
corrected = "test"

[[steps]]
action = "accept"
id = "sg-0"

[[steps]]
action = "reject"
id = "sg-0"
"#,
            "",
        );
        let outcome = run_scenario(&fixture).unwrap();
        let summary: Vec<(&str, Option<&str>, u64)> = outcome
            .steps
            .iter()
            .map(|s| (s.action.as_str(), s.error.as_deref(), s.version))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("propose", None, 1),
                ("accept", None, 2),
                ("reject", Some("already_resolved"), 2),
            ]
        );
        assert_eq!(outcome.steps[0].suggestions, vec!["sg-0"]);
        assert_eq!(outcome.text, "See on test");
        assert_eq!(outcome.identifiers, vec!["w1", "w2", "w42"]);
    }

    #[test]
    fn test_check_reports_mismatches() {
        let fixture = fixture(
            r#"
[[steps]]
action = "propose"
original = "puudub"
corrected = "olemas"

[[steps]]
action = "undo"
expect_error = "nothing_to_undo"
"#,
            "text = \"See on test\"\npending = 0\nversion = 0\n",
        );
        let outcome = run_scenario(&fixture).unwrap();
        assert_eq!(
            expectation_refs(&fixture),
            vec!["step[0]", "step[1]", "text", "pending", "version"]
        );
        assert_eq!(
            check_scenario(&fixture, &outcome),
            vec![
                ExpectationFailure {
                    expectation: "step[0]".into(),
                    expected: "ok".into(),
                    actual: "error no_match".into(),
                },
                ExpectationFailure {
                    expectation: "text".into(),
                    expected: "See on test".into(),
                    actual: "See on testt".into(),
                },
            ]
        );
    }
}
