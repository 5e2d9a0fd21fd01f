//! Persisted correction records.
//!
//! Storage hands the session a list of records; the session applies the
//! pending ones as suggestions and reports a summary. Records are updated in
//! place so the caller can write them back.

use crate::correction::{CorrectionRequest, DEFAULT_CONFIDENCE};
use crate::resolution::SuggestionState;
use crate::session::Session;
use layered_transcript::{Scope, SuggestionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Accepted,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRecord {
    pub id: String,
    pub block_index: usize,
    pub original_text: String,
    pub corrected_text: String,
    pub status: RecordStatus,
    #[serde(default)]
    pub reason: String,
    /// Suggestions created for this record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<SuggestionId>,
    /// Why applying the record failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CorrectionRecord {
    pub fn new(
        id: impl Into<String>,
        block_index: usize,
        original_text: impl Into<String>,
        corrected_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            block_index,
            original_text: original_text.into(),
            corrected_text: corrected_text.into(),
            status: RecordStatus::Pending,
            reason: String::new(),
            suggestions: Vec::new(),
            error: None,
        }
    }

    /// The record as a request scoped to its block.
    pub fn request(&self) -> CorrectionRequest {
        CorrectionRequest::new(self.original_text.clone(), self.corrected_text.clone())
            .with_reason(self.reason.clone())
            .with_confidence(DEFAULT_CONFIDENCE)
            .with_scope(Scope::Block(self.block_index))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub applied: usize,
    pub failed: usize,
    pub suggestions: Vec<SuggestionId>,
    /// Document version after the records were applied.
    pub version: u64,
}

impl Session {
    /// Apply every pending record that has no suggestions yet.
    ///
    /// Each record is a separate version. A record that cannot be placed is
    /// marked `Failed` with the reason and does not stop the others.
    pub fn apply_records(&mut self, records: &mut [CorrectionRecord]) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for record in records
            .iter_mut()
            .filter(|record| record.status == RecordStatus::Pending && record.suggestions.is_empty())
        {
            match self.propose(&record.request()) {
                Ok(applied) => {
                    summary.applied += 1;
                    summary.suggestions.extend(applied.suggestions.iter().cloned());
                    record.suggestions = applied.suggestions;
                    record.error = None;
                }
                Err(err) => {
                    tracing::warn!(record = %record.id, kind = err.kind(), "correction record failed");
                    summary.failed += 1;
                    record.status = RecordStatus::Failed;
                    record.error = Some(err.to_string());
                }
            }
        }
        summary.version = self.version();
        summary
    }

    /// Settle records whose suggestions have all been resolved.
    ///
    /// A record counts as accepted when any of its suggestions was accepted.
    /// Returns how many records changed status.
    pub fn sync_records(&self, records: &mut [CorrectionRecord]) -> usize {
        let mut changed = 0;
        for record in records
            .iter_mut()
            .filter(|record| record.status == RecordStatus::Pending && !record.suggestions.is_empty())
        {
            let states: Vec<Option<SuggestionState>> = record
                .suggestions
                .iter()
                .map(|id| self.suggestion_state(id))
                .collect();
            if states
                .iter()
                .any(|state| !matches!(state, Some(s) if s.is_terminal()))
            {
                continue;
            }
            record.status = if states.contains(&Some(SuggestionState::Accepted)) {
                RecordStatus::Accepted
            } else {
                RecordStatus::Rejected
            };
            changed += 1;
        }
        changed
    }
}
