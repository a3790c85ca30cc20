//! Saving and restoring the selection across structural edits, plus the
//! insert operations that are defined in terms of it.

use super::outer_text::OuterText;
use super::range::{self, common_ancestor, delete_contents, insert_at, split_at};
use super::{
    Boundary, END_MARKER_ID, Position, START_MARKER_ID, create_marker, find_marker,
    is_valid_boundary,
};
use crate::dom::markup::parse_fragment;
use crate::dom::nesting::{self, can_have_children, is_inline};
use crate::dom::{Document, NodeId};
use crate::keywords::keystroke::{self, KeystrokeMatch};
use crate::keywords::{KeywordTable, replacement_markup};

/// Placeholder text given to an empty trailing block so the caret has
/// somewhere to land.
const ZERO_WIDTH_SPACE: &str = "\u{200B}";

/// Attribute on a saved marker recording the form of the boundary it took
/// the place of.
const ANCHOR_ATTR: &str = "data-anchor";

/// Form of a saved boundary, so removing the marker gives back exactly the
/// boundary that was saved rather than an equivalent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Child offset in an element.
    Element,
    /// Start of a text node.
    TextStart,
    /// End of a text node.
    TextEnd,
    /// Inside a text node, which the marker split in two.
    Split,
}

impl Anchor {
    fn of(doc: &Document, at: Boundary) -> Self {
        match doc.text(at.node) {
            None => Self::Element,
            Some(_) if at.offset == 0 => Self::TextStart,
            Some(text) if at.offset >= text.len() => Self::TextEnd,
            Some(_) => Self::Split,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::TextStart => "text-start",
            Self::TextEnd => "text-end",
            Self::Split => "split",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "element" => Some(Self::Element),
            "text-start" => Some(Self::TextStart),
            "text-end" => Some(Self::TextEnd),
            "split" => Some(Self::Split),
            _ => None,
        }
    }
}

/// Borrowed view over a [`Document`] that knows about its live selection
/// and the marker anchors.
pub struct PositionTracker<'a> {
    doc: &'a mut Document,
}

impl Document {
    pub fn tracker(&mut self) -> PositionTracker<'_> {
        PositionTracker { doc: self }
    }
}

impl<'a> PositionTracker<'a> {
    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// The live selection in document order, `None` if there is none or it
    /// points at nodes that are gone.
    pub fn selected_range(&self) -> Option<Position> {
        let selection = self.doc.selection()?;
        if !is_valid_boundary(self.doc, &selection.start) || !is_valid_boundary(self.doc, &selection.end) {
            return None;
        }
        range::ordered(self.doc, selection)
    }

    pub fn has_selection(&self) -> bool {
        self.selected_range().is_some()
    }

    /// Snapshot of the current selection.
    pub fn clone_selected(&self) -> Option<Position> {
        self.selected_range()
    }

    /// Whether `other` describes the current selection. Two absent
    /// selections compare equal.
    pub fn compare(&self, other: Option<&Position>) -> bool {
        self.selected_range().as_ref() == other
    }

    /// The collapsed caret, if the selection is collapsed.
    pub fn caret(&self) -> Option<Boundary> {
        self.selected_range()
            .filter(Position::is_collapsed)
            .map(|position| position.start)
    }

    /// Markup of the selected content, empty for a caret or no selection.
    pub fn selected_html(&self) -> String {
        self.selected_range()
            .map(|position| range::selected_markup(self.doc, &position))
            .unwrap_or_default()
    }

    /// Nearest element containing the whole selection.
    pub fn parent_node(&self) -> Option<NodeId> {
        let position = self.selected_range()?;
        let common = common_ancestor(self.doc, position.start.node, position.end.node)?;
        if self.doc.is_text(common) {
            self.doc.parent(common)
        } else {
            Some(common)
        }
    }

    /// Nearest block at or above `node`, or above the selection when `node`
    /// is not given.
    pub fn first_block_parent(&self, node: Option<NodeId>) -> Option<NodeId> {
        let node = node.or_else(|| self.parent_node())?;
        nesting::first_block_parent(self.doc, node)
    }

    /// Place marker anchors at the selection boundaries. A no-op when
    /// markers are already present or there is no selection.
    pub fn save(&mut self) {
        if find_marker(self.doc, START_MARKER_ID).is_some() {
            return;
        }
        let Some(position) = self.selected_range() else {
            log::trace!("save: no selection");
            return;
        };
        let collapsed = position.is_collapsed();

        // end first: inserting there never moves the start boundary
        let end_marker = if collapsed {
            None
        } else {
            let marker = self.anchored_marker(END_MARKER_ID, position.end);
            if insert_at(self.doc, position.end, marker).is_none() {
                self.doc.remove(marker);
                return;
            }
            Some(marker)
        };
        let start_marker = self.anchored_marker(START_MARKER_ID, position.start);
        if insert_at(self.doc, position.start, start_marker).is_none() {
            self.doc.remove(start_marker);
            if let Some(marker) = end_marker {
                self.doc.remove(marker);
            }
            return;
        }

        let start = self.after_node(start_marker);
        let end = end_marker.and_then(|marker| self.before_node(marker)).or(start);
        if let (Some(start), Some(end)) = (start, end) {
            self.doc.set_selection(Some(Position::new(start, end)));
        }
    }

    fn anchored_marker(&mut self, marker_id: &str, at: Boundary) -> NodeId {
        let anchor = Anchor::of(self.doc, at);
        let marker = create_marker(self.doc, marker_id);
        self.doc.set_attr(marker, ANCHOR_ATTR, anchor.as_str());
        marker
    }

    /// Rebuild the selection from the markers and remove them. Returns
    /// `false` when no start marker is attached, leaving the selection alone.
    pub fn restore(&mut self) -> bool {
        let Some(start_marker) = find_marker(self.doc, START_MARKER_ID) else {
            log::trace!("restore: no start marker");
            return false;
        };
        let end_marker = find_marker(self.doc, END_MARKER_ID);

        let Some(mut start) = self.take_marker(start_marker, &mut []) else {
            return false;
        };
        let end = match end_marker {
            Some(marker) => self.take_marker(marker, &mut [&mut start]),
            None => Some(start),
        };
        self.doc
            .set_selection(Some(Position::new(start, end.unwrap_or(start))));
        true
    }

    /// Remove any markers without touching the live selection beyond
    /// keeping it pointed at the same content.
    pub fn remove_markers(&mut self) {
        let mut live = self.doc.selection().copied();
        for marker_id in [START_MARKER_ID, END_MARKER_ID] {
            let Some(marker) = find_marker(self.doc, marker_id) else {
                continue;
            };
            match live.as_mut() {
                Some(Position { start, end }) => {
                    self.take_marker(marker, &mut [start, end]);
                }
                None => {
                    self.take_marker(marker, &mut []);
                }
            }
        }
        self.doc.set_selection(live);
    }

    /// Remove a marker and return the boundary where it stood, in the form
    /// recorded when it was saved. Text split by the marker is joined again.
    /// `others` are rewritten to keep pointing at the same content, and a
    /// boundary sitting right where the marker was takes the returned form.
    fn take_marker(&mut self, marker: NodeId, others: &mut [&mut Boundary]) -> Option<Boundary> {
        let parent = self.doc.parent(marker)?;
        let index = self.doc.index_in_parent(marker)?;
        let anchor = self.doc.attr(marker, ANCHOR_ATTR).and_then(Anchor::parse);
        self.doc.remove(marker);
        for boundary in others.iter_mut() {
            if boundary.node == parent && boundary.offset > index {
                boundary.offset -= 1;
            }
        }

        let left = index
            .checked_sub(1)
            .and_then(|i| self.doc.child(parent, i))
            .filter(|&node| self.doc.is_text(node));
        let right = self
            .doc
            .child(parent, index)
            .filter(|&node| self.doc.is_text(node));

        let at = match (anchor, left, right) {
            (Some(Anchor::Element), _, _) => Boundary::new(parent, index),
            (Some(Anchor::TextStart), _, Some(right)) => Boundary::new(right, 0),
            (Some(Anchor::TextEnd), Some(left), _) => Boundary::new(left, self.doc.node_len(left)),
            (_, Some(left), Some(right)) => {
                let left_len = self.doc.merge_text(left, right)?;
                for boundary in others.iter_mut() {
                    if boundary.node == right {
                        **boundary = Boundary::new(left, left_len + boundary.offset);
                    } else if boundary.node == parent && boundary.offset == index {
                        **boundary = Boundary::new(left, left_len);
                    } else if boundary.node == parent && boundary.offset > index {
                        boundary.offset -= 1;
                    }
                }
                return Some(Boundary::new(left, left_len));
            }
            (_, Some(left), None) => Boundary::new(left, self.doc.node_len(left)),
            (_, None, Some(right)) => Boundary::new(right, 0),
            (_, None, None) => Boundary::new(parent, index),
        };
        for boundary in others.iter_mut() {
            if boundary.node == parent && boundary.offset == index {
                **boundary = at;
            }
        }
        Some(at)
    }

    fn after_node(&self, node: NodeId) -> Option<Boundary> {
        let parent = self.doc.parent(node)?;
        Some(Boundary::new(parent, self.doc.index_in_parent(node)? + 1))
    }

    fn before_node(&self, node: NodeId) -> Option<Boundary> {
        let parent = self.doc.parent(node)?;
        Some(Boundary::new(parent, self.doc.index_in_parent(node)?))
    }

    /// Replace the selection with `content`. With `end_content` the selected
    /// markup is kept and wrapped: `content + selection + end_content`.
    /// The caret ends up right after the inserted content.
    pub fn insert_html(&mut self, content: &str, end_content: Option<&str>) -> bool {
        self.remove_markers();
        let Some(position) = self.selected_range() else {
            return false;
        };
        let mut markup = content.to_string();
        if let Some(end_content) = end_content {
            markup.push_str(&range::selected_markup(self.doc, &position));
            markup.push_str(end_content);
        }
        let fragment = parse_fragment(self.doc, &markup);
        self.insert_fragment(fragment, position)
    }

    fn insert_fragment(&mut self, fragment: NodeId, position: Position) -> bool {
        let Some(mut last) = self.doc.last_child(fragment) else {
            self.doc.remove(fragment);
            let Some(at) = delete_contents(self.doc, &position) else {
                return false;
            };
            self.doc.set_selection(Some(Position::new(at, at)));
            return true;
        };

        while let Some(inner) = self.doc.last_child(last)
            && !is_inline(self.doc, inner, true)
        {
            last = inner;
        }
        let target = if can_have_children(self.doc, last) {
            if self.doc.children(last).is_empty() {
                let placeholder = self.doc.create_text(ZERO_WIDTH_SPACE);
                self.doc.append_child(last, placeholder);
            }
            last
        } else {
            fragment
        };
        let marker = create_marker(self.doc, START_MARKER_ID);
        self.doc.append_child(target, marker);

        let Some(at) = delete_contents(self.doc, &position) else {
            self.doc.remove(fragment);
            return false;
        };
        let at = self.outside_childless(at);
        let Some((parent, index)) = split_at(self.doc, at) else {
            self.doc.remove(fragment);
            return false;
        };
        for (i, child) in self.doc.take_children(fragment).into_iter().enumerate() {
            self.doc.insert_child(parent, index + i, child);
        }
        self.doc.remove(fragment);
        self.restore()
    }

    /// A boundary inside an element that cannot hold children moves to just
    /// after that element.
    fn outside_childless(&self, at: Boundary) -> Boundary {
        if self.doc.is_element(at.node)
            && !can_have_children(self.doc, at.node)
            && let Some(after) = self.after_node(at.node)
        {
            return after;
        }
        at
    }

    /// Type `value` at the selection, replacing any selected content.
    pub fn insert_text(&mut self, value: &str) -> bool {
        let Some(position) = self.selected_range() else {
            return false;
        };
        let at = if position.is_collapsed() {
            position.start
        } else {
            match delete_contents(self.doc, &position) {
                Some(at) => at,
                None => return false,
            }
        };
        let at = self.outside_childless(at);

        let caret = if self.doc.is_text(at.node) {
            self.doc.insert_text(at.node, at.offset, value);
            Boundary::new(at.node, at.offset + value.len())
        } else {
            let (parent, index) = (at.node, at.offset);
            let previous = index
                .checked_sub(1)
                .and_then(|i| self.doc.child(parent, i))
                .filter(|&node| self.doc.is_text(node));
            let next = self
                .doc
                .child(parent, index)
                .filter(|&node| self.doc.is_text(node));
            if let Some(previous) = previous {
                let len = self.doc.node_len(previous);
                self.doc.insert_text(previous, len, value);
                Boundary::new(previous, len + value.len())
            } else if let Some(next) = next {
                self.doc.insert_text(next, 0, value);
                Boundary::new(next, value.len())
            } else {
                let text = self.doc.create_text(value);
                self.doc.insert_child(parent, index, text);
                Boundary::new(text, value.len())
            }
        };
        self.doc.set_selection(Some(Position::new(caret, caret)));
        true
    }

    /// Delete the selected content, or the character or node before a caret.
    pub fn delete_backward(&mut self) -> bool {
        let Some(position) = self.selected_range() else {
            return false;
        };
        if !position.is_collapsed() {
            let Some(at) = delete_contents(self.doc, &position) else {
                return false;
            };
            self.doc.set_selection(Some(Position::new(at, at)));
            return true;
        }

        let mut at = position.start;
        if self.doc.is_element(at.node)
            && let Some(previous) = at.offset.checked_sub(1).and_then(|i| self.doc.child(at.node, i))
        {
            if !self.doc.is_text(previous) {
                self.doc.remove(previous);
                self.doc.set_caret(at.node, at.offset - 1);
                return true;
            }
            at = Boundary::new(previous, self.doc.node_len(previous));
        }

        let Some(text) = self.doc.text(at.node) else {
            return false;
        };
        let Some(removed) = text[..at.offset].chars().next_back() else {
            return false;
        };
        let from = at.offset - removed.len_utf8();
        let mut value = text.to_string();
        value.replace_range(from..at.offset, "");
        self.doc.set_text(at.node, &value);
        self.doc.set_caret(at.node, from);
        true
    }

    /// Check the text around the caret, including the character being
    /// typed, against the keyword table and replace a match with its
    /// replacement element.
    ///
    /// Only text up to `max_len` chars (plus one for the boundary check)
    /// either side of the caret is considered. With `only_at_caret` the text
    /// after the caret is ignored. With `require_whitespace` or `compat_mode`
    /// a match must be delimited by whitespace or the edge of the block.
    pub fn replace_keyword(
        &mut self,
        table: &KeywordTable,
        only_at_caret: bool,
        require_whitespace: bool,
        max_len: usize,
        compat_mode: bool,
        typed: Option<char>,
    ) -> bool {
        let bounded = require_whitespace || compat_mode;
        self.replace_keyword_at_caret(table, only_at_caret, bounded, max_len, typed)
            .is_some()
    }

    pub(crate) fn replace_keyword_at_caret(
        &mut self,
        table: &KeywordTable,
        only_at_caret: bool,
        bounded: bool,
        max_len: usize,
        typed: Option<char>,
    ) -> Option<KeystrokeMatch> {
        let caret = self.caret()?;
        let limit = max_len + usize::from(bounded);
        let after = if only_at_caret { 0 } else { limit };
        let outer = OuterText::around(self.doc, caret, limit, after)?;

        let found = keystroke::find_match(&outer, table, typed, bounded)?;
        let span = outer.span(found.start, found.end)?;
        let keyword = table.get(&found.code)?;

        self.doc.set_selection(Some(span));
        if !self.insert_html(&replacement_markup(keyword), None) {
            return None;
        }
        log::debug!("replaced keyword {:?} at caret", found.code);
        Some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::KeywordDescriptor;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn node_at(doc: &Document, path: &[usize]) -> NodeId {
        let mut node = doc.root();
        for &index in path {
            node = doc.child(node, index).unwrap();
        }
        node
    }

    fn markup_with_markers(doc: &Document) -> String {
        crate::dom::markup::serialize_children(doc, doc.root(), true)
    }

    #[test]
    fn save_then_restore_returns_the_same_caret() {
        let mut doc = Document::from_markup("<p>hello world</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 5);

        doc.tracker().save();
        assert!(markup_with_markers(&doc).contains("start-marker"));
        assert_eq!(doc.markup(), "<p>hello world</p>");

        assert!(doc.tracker().restore());
        assert_eq!(doc.selection(), Some(&Position::caret(text, 5)));
        assert_eq!(doc.children(node_at(&doc, &[0])).len(), 1);
    }

    #[test]
    fn save_then_restore_range_within_one_node() {
        let mut doc = Document::from_markup("<p>abcdef</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_selection(Some(Position::new(Boundary::new(text, 1), Boundary::new(text, 4))));

        let mut tracker = doc.tracker();
        tracker.save();
        assert!(tracker.restore());

        assert_eq!(
            doc.selection(),
            Some(&Position::new(Boundary::new(text, 1), Boundary::new(text, 4)))
        );
        assert_eq!(doc.markup(), "<p>abcdef</p>");
    }

    #[test]
    fn save_is_idempotent() {
        let mut doc = Document::from_markup("<p>abc</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 1);

        doc.tracker().save();
        let once = markup_with_markers(&doc);
        doc.tracker().save();
        assert_eq!(markup_with_markers(&doc), once);
        assert_eq!(once.matches("start-marker").count(), 1);
    }

    #[test]
    fn save_without_selection_does_nothing() {
        let mut doc = Document::from_markup("<p>abc</p>");
        doc.tracker().save();
        assert_eq!(markup_with_markers(&doc), "<p>abc</p>");
        assert!(!doc.tracker().restore());
    }

    #[test]
    fn restore_survives_wrapping_edit() {
        let mut doc = Document::from_markup("<p>one two</p>");
        let p = node_at(&doc, &[0]);
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 4);
        doc.tracker().save();

        // wrap everything in a <b>
        let bold = doc.create_element("b");
        doc.move_children(p, bold);
        doc.append_child(p, bold);

        assert!(doc.tracker().restore());
        let caret = *doc.selection().unwrap();
        assert!(caret.is_collapsed());
        assert_eq!(doc.text(caret.start.node), Some("one two"));
        assert_eq!(caret.start.offset, 4);
        assert_eq!(doc.markup(), "<p><b>one two</b></p>");
    }

    #[test]
    fn restore_after_marker_destroyed_leaves_selection() {
        let mut doc = Document::from_markup("<p>abc</p>");
        let p = node_at(&doc, &[0]);
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 1);
        doc.tracker().save();
        let saved = doc.selection().copied();

        doc.remove(p);
        assert!(!doc.tracker().restore());
        assert_eq!(doc.selection().copied(), saved);
    }

    #[test]
    fn remove_markers_keeps_caret_on_same_content() {
        let mut doc = Document::from_markup("<p>abcd</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 2);
        let mut tracker = doc.tracker();
        tracker.save();
        tracker.remove_markers();

        assert_eq!(doc.selection(), Some(&Position::caret(text, 2)));
        assert_eq!(markup_with_markers(&doc), "<p>abcd</p>");
    }

    #[rstest]
    #[case::before_text(0)]
    #[case::between_text_and_element(1)]
    #[case::after_element(2)]
    fn save_then_restore_keeps_element_offsets(#[case] offset: usize) {
        let mut doc = Document::from_markup("<p>ab<b>c</b></p>");
        let p = node_at(&doc, &[0]);
        doc.set_caret(p, offset);

        let mut tracker = doc.tracker();
        tracker.save();
        assert!(tracker.restore());

        assert_eq!(doc.selection(), Some(&Position::caret(p, offset)));
        assert_eq!(doc.markup(), "<p>ab<b>c</b></p>");
    }

    #[test]
    fn adjacent_text_nodes_stay_apart() {
        let mut doc = Document::new();
        let root = doc.root();
        let (left, right) = (doc.create_text("ab"), doc.create_text("cd"));
        doc.append_child(root, left);
        doc.append_child(root, right);
        doc.set_caret(right, 0);

        let mut tracker = doc.tracker();
        tracker.save();
        assert!(tracker.restore());

        assert_eq!(doc.selection(), Some(&Position::caret(right, 0)));
        assert_eq!(doc.children(root), &[left, right]);
    }

    #[test]
    fn remove_markers_gives_back_the_text_end_caret() {
        let mut doc = Document::from_markup("<p>ab<b>c</b></p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 2);

        let mut tracker = doc.tracker();
        tracker.save();
        tracker.remove_markers();

        assert_eq!(doc.selection(), Some(&Position::caret(text, 2)));
    }

    #[rstest]
    #[case::anywhere(false, true)]
    #[case::compat_needs_a_boundary(true, false)]
    fn replace_keyword_respects_compat_mode(#[case] compat_mode: bool, #[case] expected: bool) {
        let table = KeywordTable::new([(
            "lol".to_string(),
            KeywordDescriptor {
                content_url: "lol.png".to_string(),
                tooltip: None,
            },
        )]);
        let mut doc = Document::from_markup("<p>xlo</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 3);

        let replaced = doc
            .tracker()
            .replace_keyword(&table, false, false, 3, compat_mode, Some('l'));
        assert_eq!(replaced, expected);
    }

    #[test]
    fn insert_html_replaces_selection_and_places_caret_after() {
        let mut doc = Document::from_markup("<p>abcdef</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_selection(Some(Position::new(Boundary::new(text, 2), Boundary::new(text, 4))));

        assert!(doc.tracker().insert_html("<img src=\"x.png\">", None));
        assert_eq!(doc.markup(), "<p>ab<img src=\"x.png\">ef</p>");

        let caret = *doc.selection().unwrap();
        assert!(caret.is_collapsed());
        assert_eq!(doc.text(caret.start.node), Some("ef"));
        assert_eq!(caret.start.offset, 0);
    }

    #[test]
    fn insert_html_wraps_selection() {
        let mut doc = Document::from_markup("<p>one two</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_selection(Some(Position::new(Boundary::new(text, 4), Boundary::new(text, 7))));

        assert!(doc.tracker().insert_html("<b>", Some("</b>")));
        assert_eq!(doc.markup(), "<p>one <b>two</b></p>");
    }

    #[test]
    fn insert_html_descends_into_trailing_block() {
        let mut doc = Document::from_markup("");
        let root = doc.root();
        doc.set_caret(root, 0);

        assert!(doc.tracker().insert_html("<p>first</p><p></p>", None));
        let caret = *doc.selection().unwrap();
        let second = node_at(&doc, &[1]);
        assert_eq!(doc.parent(caret.start.node), Some(second));
        assert_eq!(doc.text(caret.start.node), Some(ZERO_WIDTH_SPACE));
    }

    #[test]
    fn insert_text_types_at_caret() {
        let mut doc = Document::from_markup("<p>ac</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 1);

        assert!(doc.tracker().insert_text("b"));
        assert_eq!(doc.markup(), "<p>abc</p>");
        assert_eq!(doc.selection(), Some(&Position::caret(text, 2)));
    }

    #[test]
    fn delete_backward_removes_previous_char_or_node() {
        let mut doc = Document::from_markup("<p>añ<img src=\"x\"></p>");
        let p = node_at(&doc, &[0]);
        doc.set_caret(p, 2);

        let mut tracker = doc.tracker();
        assert!(tracker.delete_backward());
        assert!(tracker.delete_backward());
        assert_eq!(doc.markup(), "<p>a</p>");
    }

    #[test]
    fn parent_node_and_block() {
        let mut doc = Document::from_markup("<div><p>a<b>bold</b></p></div>");
        let p = node_at(&doc, &[0, 0]);
        let bold = node_at(&doc, &[0, 0, 1]);
        let text = node_at(&doc, &[0, 0, 1, 0]);
        doc.set_caret(text, 2);

        let tracker = doc.tracker();
        assert_eq!(tracker.parent_node(), Some(bold));
        assert_eq!(tracker.first_block_parent(None), Some(p));
    }

    #[test]
    fn compare_detects_movement() {
        let mut doc = Document::from_markup("<p>abc</p>");
        let text = node_at(&doc, &[0, 0]);
        doc.set_caret(text, 1);
        let before = doc.tracker().clone_selected();

        assert!(doc.tracker().compare(before.as_ref()));
        doc.set_caret(text, 2);
        assert!(!doc.tracker().compare(before.as_ref()));

        doc.set_selection(None);
        assert!(doc.tracker().compare(None));
    }

    #[test]
    fn selected_html_of_range() {
        let mut doc = Document::from_markup("<p>a<i>bc</i>d</p>");
        let p = node_at(&doc, &[0]);
        doc.set_selection(Some(Position::new(Boundary::new(p, 1), Boundary::new(p, 3))));
        assert_eq!(doc.tracker().selected_html(), "<i>bc</i>d");
    }
}
