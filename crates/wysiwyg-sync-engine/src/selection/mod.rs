/*!
 * # Selection tracking
 *
 * A caret or selection is an explicit [`Position`] value: two
 * `(container, offset)` boundaries. For a text container the offset is a byte
 * offset into its string, for an element it is a child index.
 *
 * A `Position` is only a snapshot. Splitting, merging or removing nodes can
 * leave it pointing at nodes that no longer exist. To carry a position across
 * a structural edit the [`PositionTracker`] splices zero-width marker
 * elements into the tree at the boundaries (`save`) and derives a fresh
 * position from wherever those markers ended up (`restore`).
 *
 * Markers are never part of an externally observable read: every public
 * serializer skips them.
 */

pub mod outer_text;
pub mod range;
pub mod tracker;

pub use tracker::PositionTracker;

use crate::dom::{Document, NodeId};

/// Reserved id of the marker placed at the selection start.
pub const START_MARKER_ID: &str = "start-marker";
/// Reserved id of the marker placed at the selection end.
pub const END_MARKER_ID: &str = "end-marker";

/// One end of a selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A caret (collapsed) or selected range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub start: Boundary,
    pub end: Boundary,
}

impl Position {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    pub fn caret(node: NodeId, offset: usize) -> Self {
        let at = Boundary::new(node, offset);
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapsed_to_start(&self) -> Self {
        Self {
            start: self.start,
            end: self.start,
        }
    }
}

/// Whether `id` is one of the marker anchors.
pub fn is_marker(doc: &Document, id: NodeId) -> bool {
    doc.is_tag(id, &["span"])
        && matches!(doc.attr(id, "id"), Some(START_MARKER_ID | END_MARKER_ID))
}

/// Locate an attached marker by its reserved id.
pub fn find_marker(doc: &Document, marker_id: &str) -> Option<NodeId> {
    let root = doc.root();
    doc.descendants(root)
        .into_iter()
        .find(|&node| doc.is_tag(node, &["span"]) && doc.attr(node, "id") == Some(marker_id))
}

pub(crate) fn create_marker(doc: &mut Document, marker_id: &str) -> NodeId {
    doc.create_element_with(
        "span",
        vec![
            ("id".to_string(), marker_id.to_string()),
            ("class".to_string(), "selection-marker".to_string()),
            ("style".to_string(), "line-height: 0; display: none;".to_string()),
        ],
    )
}

/// Whether a boundary points into the live tree at a valid offset.
pub fn is_valid_boundary(doc: &Document, boundary: &Boundary) -> bool {
    if !doc.is_attached(boundary.node) {
        return false;
    }
    match doc.text(boundary.node) {
        Some(text) => boundary.offset <= text.len() && text.is_char_boundary(boundary.offset),
        None => boundary.offset <= doc.node_len(boundary.node),
    }
}
