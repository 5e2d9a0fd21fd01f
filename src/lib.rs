#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Time-aligned transcript documents for review tooling.
//!
//! ## Modules
//!
//! - [`document`] - Blocks, words, text runs and marks, with ProseMirror-style positions
//! - [`transform`] - Steps, position mapping and atomic transactions
//! - [`locate`] - Finding text ranges by string, case and whole-word rules
//! - [`display`] - Plain-text rendering for debugging and snapshot tests
//!
//! The diff engine, suggestion annotation and review session live in
//! `layered-transcript-review`.

pub mod display;
pub mod document;
mod errors;
pub mod locate;
pub mod text;
pub mod transform;


pub use display::DocumentDisplay;
pub use document::{
    AnnotationMark, Block, BlockAttrs, Document, Inline, Mark, MarkSet, Parent, ResolvedPos,
    SuggestionId, SuggestionKind, SuggestionMark, TextRun, TextUnit, Word, WordAttrs, WordRef,
};
pub use errors::{DocumentError, LocateError, PositionError, StepError};
pub use locate::{locate, locate_near, LocateOptions, Scope, TextMatch};
pub use text::{fold_char, grapheme_boundaries, is_word_char};
pub use transform::{Assoc, MapResult, Mapping, Step, StepMap, Transaction};
