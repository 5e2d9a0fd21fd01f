//! Scenario fixtures.
//!
//! A fixture is a TOML file describing a transcript, a sequence of review
//! actions and the expected end state:
//!
//! ```toml
//! title = "Doubled letter"
//!
//! [[blocks]]
//! speaker = "Mari"
//! words = [{ text = "testt", at = 12.5, id = "w42" }]
//!
//! [[steps]]
//! action = "propose"
//! original = "testt"
//! corrected = "test"
//!
//! [[steps]]
//! action = "accept"
//! id = "sg-0"
//!
//! [expect]
//! text = "test"
//! ```

use crate::errors::{SpecError, SpecResult};
use layered_transcript::{Block, BlockAttrs, Document, Word};
use layered_transcript_review::SessionConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFixture {
    pub title: String,
    #[serde(default)]
    pub config: SessionConfig,
    pub blocks: Vec<BlockFixture>,
    #[serde(default)]
    pub steps: Vec<StepFixture>,
    #[serde(default)]
    pub expect: Expectations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockFixture {
    pub speaker: String,
    #[serde(default)]
    pub speaker_id: String,
    pub words: Vec<WordFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordFixture {
    pub text: String,
    /// Start time in seconds
    pub at: f64,
    pub id: String,
}

/// One review action. `expect_error` names the error kind the action must
/// fail with; without it the action must succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepFixture {
    Propose {
        original: String,
        corrected: String,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        block: Option<usize>,
        #[serde(default)]
        occurrence: Option<usize>,
        #[serde(default)]
        expect_error: Option<String>,
    },
    Accept {
        id: String,
        #[serde(default)]
        expect_error: Option<String>,
    },
    Reject {
        id: String,
        #[serde(default)]
        expect_error: Option<String>,
    },
    AcceptAll,
    RejectAll,
    Rename {
        block: usize,
        name: String,
        #[serde(default)]
        speaker_id: String,
        #[serde(default)]
        expect_error: Option<String>,
    },
    Undo {
        #[serde(default)]
        expect_error: Option<String>,
    },
}

impl StepFixture {
    pub fn action(&self) -> &'static str {
        match self {
            StepFixture::Propose { .. } => "propose",
            StepFixture::Accept { .. } => "accept",
            StepFixture::Reject { .. } => "reject",
            StepFixture::AcceptAll => "accept_all",
            StepFixture::RejectAll => "reject_all",
            StepFixture::Rename { .. } => "rename",
            StepFixture::Undo { .. } => "undo",
        }
    }

    pub fn expected_error(&self) -> Option<&str> {
        match self {
            StepFixture::Propose { expect_error, .. }
            | StepFixture::Accept { expect_error, .. }
            | StepFixture::Reject { expect_error, .. }
            | StepFixture::Rename { expect_error, .. }
            | StepFixture::Undo { expect_error } => expect_error.as_deref(),
            StepFixture::AcceptAll | StepFixture::RejectAll => None,
        }
    }
}

/// Expected end state. Unset fields are not checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expectations {
    /// Plain text, blocks joined by newlines.
    pub text: Option<String>,
    /// `DocumentDisplay` rendering.
    pub display: Option<String>,
    /// Number of pending suggestions.
    pub pending: Option<usize>,
    /// Word identifiers in document order.
    pub identifiers: Option<Vec<String>>,
    pub version: Option<u64>,
}

impl ScenarioFixture {
    /// Parse a fixture from TOML. `path` is only used in errors.
    pub fn from_toml(content: &str, path: &str) -> SpecResult<Self> {
        toml::from_str(content).map_err(|e| SpecError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Build the scenario's starting document.
    pub fn document(&self) -> SpecResult<Document> {
        let blocks = self
            .blocks
            .iter()
            .map(|block| {
                Block::with_words(
                    BlockAttrs::new(block.speaker.clone(), block.speaker_id.clone()),
                    block
                        .words
                        .iter()
                        .map(|word| Word::new(word.id.clone(), word.at, word.text.clone())),
                )
            })
            .collect();
        Document::new(blocks).map_err(|e| SpecError::Scenario {
            title: self.title.clone(),
            message: e.to_string(),
        })
    }
}
