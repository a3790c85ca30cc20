//! Matching a code against the text around the caret while typing.

use super::substitute::{find_code, is_keyword_space};
use super::table::KeywordTable;
use crate::dom::floor_char_boundary;
use crate::selection::outer_text::OuterText;

/// A code found at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystrokeMatch {
    pub code: String,
    /// Span of the match in the document's text, as byte offsets into the
    /// collected outer text. The typed character is not part of it.
    pub start: usize,
    pub end: usize,
    /// The typed character completes the code, so it must not be inserted.
    pub consumed_typed: bool,
}

/// Look for a code that touches the caret once `typed` is inserted there.
///
/// A match must start at or before the caret and end at or after it, so
/// only codes completed (or split) by this keystroke are found. Codes are
/// tried longest first. With `bounded` the code also needs a keyword space
/// or the edge of the block on both sides.
pub fn find_match(
    outer: &OuterText,
    table: &KeywordTable,
    typed: Option<char>,
    bounded: bool,
) -> Option<KeystrokeMatch> {
    let left = outer.before_caret();
    let caret = left.len();
    let typed_text = typed.map(String::from).unwrap_or_default();
    let typed_len = typed_text.len();
    let typed_is_space = typed.is_some_and(is_keyword_space);
    let combined = format!("{left}{typed_text}{}", outer.after_caret());

    for keyword in table.longest_first() {
        let code = keyword.code.as_str();
        let slack = code.len() + usize::from(bounded);
        let mut search = floor_char_boundary(&combined, caret.saturating_sub(slack));

        while let Some(start) = find_code(&combined, code, search, false) {
            if start > caret {
                break;
            }
            search = start + combined[start..].chars().next().map_or(1, char::len_utf8);

            let end = start + code.len();
            if end < caret {
                continue;
            }
            let tail = end - caret;
            let (doc_end, consumed) = match typed {
                None => (end, false),
                Some(_) if tail == 0 && !typed_is_space => continue,
                Some(_) if tail == 0 => (caret, false),
                Some(_) if typed_is_space => continue,
                Some(_) => (caret + tail - typed_len, true),
            };

            if bounded && !is_delimited(outer, &combined, start, end, consumed) {
                continue;
            }
            return Some(KeystrokeMatch {
                code: keyword.code.clone(),
                start,
                end: doc_end,
                consumed_typed: consumed,
            });
        }
    }
    None
}

fn is_delimited(outer: &OuterText, combined: &str, start: usize, end: usize, consumed: bool) -> bool {
    let before = match combined[..start].chars().next_back() {
        Some(c) => is_keyword_space(c),
        None => !outer.truncated_before,
    };
    // a code finished by a non-space keystroke is still mid-word until a
    // space actually follows it
    let after = match combined[end..].chars().next() {
        Some(c) => is_keyword_space(c),
        None => !outer.truncated_after && !consumed,
    };
    before && after
}
