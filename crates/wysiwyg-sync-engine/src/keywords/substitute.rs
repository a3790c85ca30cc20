//! Whole-tree keyword substitution and its reversal.

use super::table::{KEYWORD_ATTR, KeywordTable, create_replacement};
use super::verbatim::{VerbatimPredicate, in_verbatim};
use crate::dom::{Document, NodeId};
use crate::selection::Position;

/// Characters that delimit a keyword in compat mode: ASCII whitespace, the
/// no-break space and the typographic spaces.
pub fn is_keyword_space(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\r' | '\n' | '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}'
    )
}

/// Find `code` in `text` from byte `from`. With `bounded` the match must
/// have a keyword space or the edge of `text` on both sides.
pub(crate) fn find_code(text: &str, code: &str, from: usize, bounded: bool) -> Option<usize> {
    let mut search = from;
    while search <= text.len() {
        let found = search + text.get(search..)?.find(code)?;
        if !bounded || is_bounded(text, found, found + code.len()) {
            return Some(found);
        }
        search = found + text[found..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn is_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back().is_none_or(is_keyword_space);
    let after = text[end..].chars().next().is_none_or(is_keyword_space);
    before && after
}

/// Replace codes in every text node under `root` that is not inside a
/// verbatim region. Longer codes win over shorter ones they contain. In
/// compat mode a code only matches between keyword spaces or text edges.
///
/// Returns how many replacements were made. Running it again over its own
/// output changes nothing.
pub fn replace_keywords(
    doc: &mut Document,
    root: NodeId,
    table: &KeywordTable,
    compat: bool,
    verbatim: &dyn VerbatimPredicate,
) -> usize {
    if table.is_empty() || in_verbatim(doc, root, verbatim) {
        return 0;
    }
    convert(doc, root, table, compat, verbatim)
}

fn convert(
    doc: &mut Document,
    parent: NodeId,
    table: &KeywordTable,
    compat: bool,
    verbatim: &dyn VerbatimPredicate,
) -> usize {
    let mut replaced = 0;
    let mut next = doc.first_child(parent);
    while let Some(node) = next {
        if doc.is_element(node) {
            if !verbatim.is_verbatim(doc, node) {
                replaced += convert(doc, node, table, compat, verbatim);
            }
        } else {
            replaced += convert_text(doc, node, table, compat);
        }
        next = doc.next_sibling(node);
    }
    replaced
}

/// Replace the first occurrence of each code in one text node. The text
/// after a match goes into a new sibling which the caller visits next.
fn convert_text(doc: &mut Document, node: NodeId, table: &KeywordTable, compat: bool) -> usize {
    let mut replaced = 0;
    for keyword in table.longest_first() {
        let Some(text) = doc.text(node) else {
            break;
        };
        let Some(index) = find_code(text, &keyword.code, 0, compat) else {
            continue;
        };
        let after = text[index + keyword.code.len()..].to_string();
        let before = text[..index].to_string();

        doc.set_text(node, &before);
        let replacement = create_replacement(doc, keyword);
        doc.insert_after(node, replacement);
        if !after.is_empty() {
            let tail = doc.create_text(&after);
            doc.insert_after(replacement, tail);
        }
        replaced += 1;
    }
    replaced
}

/// Turn every replacement element under `root` back into its code.
pub fn restore_codes(doc: &mut Document, root: NodeId) -> usize {
    let replacements = replacement_elements(doc, root);
    for &node in &replacements {
        let code = doc.attr(node, KEYWORD_ATTR).unwrap_or_default().to_string();
        let text = doc.create_text(&code);
        doc.replace(node, text);
    }
    replacements.len()
}

fn replacement_elements(doc: &Document, root: NodeId) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|&node| doc.is_tag(node, &["img"]) && doc.attr(node, KEYWORD_ATTR).is_some())
        .collect()
}

/// Revert replacements that are no longer delimited by keyword spaces,
/// joining the code back into the text around it.
///
/// When the caret is in the text next to a reverted element it is moved so
/// it stays at the same character, counting the element as the length of
/// its code.
pub fn check_whitespace(doc: &mut Document, root: NodeId) -> usize {
    let mut reverted = 0;
    for node in replacement_elements(doc, root) {
        if !doc.is_attached(node) {
            continue;
        }
        let Some(parent) = doc.parent(node) else {
            continue;
        };
        let Some(index) = doc.index_in_parent(node) else {
            continue;
        };
        let previous = doc.previous_sibling(node).filter(|&n| doc.is_text(n));
        let next = doc.next_sibling(node).filter(|&n| doc.is_text(n));

        let glued_before = previous
            .and_then(|n| doc.text(n))
            .and_then(|text| text.chars().next_back())
            .is_some_and(|c| !is_keyword_space(c));
        let glued_after = next
            .and_then(|n| doc.text(n))
            .and_then(|text| text.chars().next())
            .is_some_and(|c| !is_keyword_space(c));
        if !glued_before && !glued_after {
            continue;
        }

        let code = doc.attr(node, KEYWORD_ATTR).unwrap_or_default().to_string();
        let mut joined = previous
            .and_then(|n| doc.text(n))
            .unwrap_or_default()
            .to_string();
        joined.push_str(&code);

        let caret = doc.selection().copied().and_then(|selection| {
            let at = selection.start;
            if next.is_some_and(|n| at.node == n) {
                Some(joined.len() + at.offset)
            } else if previous.is_some_and(|n| at.node == n) {
                Some(at.offset)
            } else if at.node == parent && at.offset == index + 1 {
                Some(joined.len())
            } else if at.node == parent && at.offset == index {
                Some(joined.len() - code.len())
            } else {
                None
            }
        });

        let target = match next {
            Some(next) => next,
            None => {
                let empty = doc.create_text("");
                doc.insert_after(node, empty);
                empty
            }
        };
        doc.insert_text(target, 0, &joined);
        if let Some(previous) = previous {
            doc.remove(previous);
        }
        doc.remove(node);
        if let Some(offset) = caret {
            doc.set_selection(Some(Position::caret(target, offset)));
        }
        log::debug!("reverted keyword {code:?} that lost its surrounding space");
        reverted += 1;
    }
    reverted
}
