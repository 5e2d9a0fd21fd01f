//! Marks attached to character ranges.
//!
//! Marks are a closed set: pending suggestions produced by the review engine
//! and the label/pronunciation highlights the transcript editor already
//! carries. Matching on [`Mark`] is exhaustive, so adding a new kind forces
//! every consumer to decide how to treat it.

use serde::{Deserialize, Serialize};

/// Stable identifier of a pending suggestion.
///
/// IDs follow the pattern `sg-{index}` and are never reused within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(pub String);

impl SuggestionId {
    pub const PREFIX: &'static str = "sg";

    /// Create an ID from its numeric index.
    pub fn new(index: u64) -> Self {
        Self(format!("{}-{}", Self::PREFIX, index))
    }

    /// Get the numeric index (e.g., 3 from "sg-3").
    pub fn index(&self) -> Option<u64> {
        let (prefix, index) = self.0.split_once('-')?;
        if prefix != Self::PREFIX {
            return None;
        }
        index.parse().ok()
    }
}

impl std::fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SuggestionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SuggestionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Whether a suggestion proposes adding or removing its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Insertion,
    Deletion,
}

impl std::fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionKind::Insertion => f.write_str("Insertion"),
            SuggestionKind::Deletion => f.write_str("Deletion"),
        }
    }
}

/// A pending suggestion annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionMark {
    pub id: SuggestionId,
    pub kind: SuggestionKind,
    #[serde(default)]
    pub reason: String,
    /// Confidence from 0.0 to 1.0
    pub confidence: f64,
}

impl SuggestionMark {
    pub fn new(id: SuggestionId, kind: SuggestionKind, reason: impl Into<String>, confidence: f64) -> Self {
        Self {
            id,
            kind,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Highlight carried by the editor for labelled or mispronounced spans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationMark {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AnnotationMark {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
            color: None,
        }
    }
}

/// A mark attached to a run of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Suggestion(SuggestionMark),
    Label(AnnotationMark),
    Pronunciation(AnnotationMark),
}

impl Mark {
    /// Ordering rank used to keep mark sets canonical.
    fn rank(&self) -> u8 {
        match self {
            Mark::Label(_) => 0,
            Mark::Pronunciation(_) => 1,
            Mark::Suggestion(_) => 2,
        }
    }

    /// Whether `other` denotes the same mark instance.
    ///
    /// Suggestions are identified by ID alone, so a suggestion can be removed
    /// without knowing its reason or confidence.
    pub fn same_identity(&self, other: &Mark) -> bool {
        match (self, other) {
            (Mark::Suggestion(a), Mark::Suggestion(b)) => a.id == b.id,
            _ => self == other,
        }
    }

    pub fn as_suggestion(&self) -> Option<&SuggestionMark> {
        match self {
            Mark::Suggestion(suggestion) => Some(suggestion),
            Mark::Label(_) | Mark::Pronunciation(_) => None,
        }
    }
}

/// Canonical, deduplicated set of marks on a text run.
///
/// At most one suggestion mark is present: a run is either pending insertion,
/// pending deletion, or committed text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
        marks.into_iter().fold(Self::new(), |set, mark| set.with(mark))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.iter().any(|m| m.same_identity(mark))
    }

    /// The pending suggestion on this run, if any.
    pub fn suggestion(&self) -> Option<&SuggestionMark> {
        self.0.iter().find_map(Mark::as_suggestion)
    }

    /// Return a copy with `mark` added.
    ///
    /// Adding a suggestion replaces any suggestion already present.
    pub fn with(&self, mark: Mark) -> Self {
        let mut marks: Vec<Mark> = self
            .0
            .iter()
            .filter(|m| match (&mark, m) {
                (Mark::Suggestion(_), Mark::Suggestion(_)) => false,
                _ => !m.same_identity(&mark),
            })
            .cloned()
            .collect();
        let at = marks
            .iter()
            .position(|m| m.rank() > mark.rank())
            .unwrap_or(marks.len());
        marks.insert(at, mark);
        Self(marks)
    }

    /// Return a copy with `mark` removed.
    pub fn without(&self, mark: &Mark) -> Self {
        Self(
            self.0
                .iter()
                .filter(|m| !m.same_identity(mark))
                .cloned()
                .collect(),
        )
    }

    /// Return a copy with every suggestion mark removed.
    pub fn without_suggestions(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|m| m.as_suggestion().is_none())
                .cloned()
                .collect(),
        )
    }
}
