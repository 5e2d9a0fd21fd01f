#![doc(html_root_url = "https://docs.rs/layered-transcript-specs/0.1.0")]
//! Scenario-driven tests for `layered-transcript-review` sessions.
//!
//! A scenario is a TOML fixture holding a transcript, a list of review
//! actions and the expected end state. The harness runs each scenario
//! against a fresh [`Session`](layered_transcript_review::Session) and
//! classifies mismatches against `expected-failures.toml`.
//!
//! ## Modules
//!
//! - [`fixture`]: scenario types and TOML parsing
//! - [`loader`]: loading fixture files from disk
//! - [`runner`]: running scenarios and checking expectations
//! - [`failures`]: known and pending failures
//! - [`report`]: harness runs and RON reports

pub mod errors;
pub mod failures;
pub mod fixture;
pub mod loader;
pub mod report;
pub mod runner;


pub use errors::{SpecError, SpecResult};
pub use failures::{ExpectedFailures, FailureEntry, FailureState, HarnessResult};
pub use fixture::{BlockFixture, Expectations, ScenarioFixture, StepFixture, WordFixture};
pub use loader::{load_all_fixtures, load_fixture};
pub use report::{run_harness, FixtureReport, HarnessReport, ReportedFailure};
pub use runner::{check_scenario, expectation_refs, run_scenario, ExpectationFailure, ScenarioOutcome, StepOutcome};
