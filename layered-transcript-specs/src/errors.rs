//! Error types for the scenario harness.

use thiserror::Error;

/// Errors that can occur while loading or running scenarios.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A fixture file could not be read.
    #[error("failed to load fixture: {path}: {message}")]
    Load { path: String, message: String },

    /// A fixture file is not a valid scenario.
    #[error("failed to parse fixture: {path}: {message}")]
    Parse { path: String, message: String },

    /// The scenario describes an invalid document.
    #[error("invalid scenario {title:?}: {message}")]
    Scenario { title: String, message: String },

    /// A harness report could not be written or read.
    #[error("report error: {message}")]
    Report { message: String },
}

/// Result type for harness operations.
pub type SpecResult<T> = Result<T, SpecError>;
