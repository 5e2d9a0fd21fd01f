//! Character-level helpers shared by the locator and the diff engine.

use unicode_segmentation::UnicodeSegmentation;

/// Lowercase `ch` when its lowercase form is a single `char`.
///
/// Chars whose lowercase expands (e.g. `İ`) are returned unchanged so that
/// folded text stays aligned one-to-one with document positions.
pub fn fold_char(ch: char) -> char {
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) => folded,
        _ => ch,
    }
}

/// Word characters for whole-word matching: letters, digits and `_`.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// For each char offset `0..=chars.len()`, whether it is an extended
/// grapheme cluster boundary.
pub fn grapheme_boundaries(chars: &[char]) -> Vec<bool> {
    let text: String = chars.iter().collect();
    let mut boundaries = vec![false; chars.len() + 1];
    let mut offset = 0;
    for grapheme in text.graphemes(true) {
        boundaries[offset] = true;
        offset += grapheme.chars().count();
    }
    boundaries[chars.len()] = true;
    boundaries
}
