//! Operations over the content between two boundaries.
//!
//! Boundaries are compared as paths: the child indices leading from the root
//! to the container, followed by the offset. A node lies inside a range when
//! the point just before it and the point just after it both fall within the
//! range, which is the same containment rule the platform range API uses.

use super::{Boundary, Position, is_marker};
use crate::dom::markup::{serialize_node, write_close_tag, write_open_tag};
use crate::dom::{Document, NodeId};

/// Child indices from the root down to `id`. `None` for detached nodes.
pub fn node_path(doc: &Document, id: NodeId) -> Option<Vec<usize>> {
    if !doc.is_attached(id) {
        return None;
    }
    let mut path = Vec::new();
    let mut current = id;
    while let Some(parent) = doc.parent(current) {
        path.push(doc.index_in_parent(current)?);
        current = parent;
    }
    path.reverse();
    Some(path)
}

/// Path of a boundary: its container's path plus the offset.
pub fn point_path(doc: &Document, boundary: &Boundary) -> Option<Vec<usize>> {
    let mut path = node_path(doc, boundary.node)?;
    path.push(boundary.offset);
    Some(path)
}

/// Document order of two boundaries, `None` if either is detached.
pub fn compare_boundaries(doc: &Document, a: &Boundary, b: &Boundary) -> Option<std::cmp::Ordering> {
    Some(point_path(doc, a)?.cmp(&point_path(doc, b)?))
}

/// A position with its endpoints swapped into document order if needed.
pub fn ordered(doc: &Document, position: &Position) -> Option<Position> {
    let start = point_path(doc, &position.start)?;
    let end = point_path(doc, &position.end)?;
    Some(if start <= end {
        *position
    } else {
        Position::new(position.end, position.start)
    })
}

struct Span {
    start: Vec<usize>,
    end: Vec<usize>,
}

impl Span {
    fn of(doc: &Document, position: &Position) -> Option<Self> {
        let start = point_path(doc, &position.start)?;
        let end = point_path(doc, &position.end)?;
        Some(if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        })
    }

    /// `(before, after)` points of the child at `index` under `parent_path`.
    fn child_points(parent_path: &[usize], index: usize) -> (Vec<usize>, Vec<usize>) {
        let mut before = parent_path.to_vec();
        before.push(index);
        let mut after = parent_path.to_vec();
        after.push(index + 1);
        (before, after)
    }

    fn overlaps(&self, before: &[usize], after: &[usize]) -> bool {
        after > self.start.as_slice() && before < self.end.as_slice()
    }

    fn covers(&self, before: &[usize], after: &[usize]) -> bool {
        self.start.as_slice() <= before && after <= self.end.as_slice()
    }

    /// Selected byte range of a partially covered text node.
    fn text_slice(&self, text_path: &[usize], len: usize) -> (usize, usize) {
        let inside = |point: &[usize]| point.len() == text_path.len() + 1 && point.starts_with(text_path);
        let from = if inside(&self.start) {
            self.start[text_path.len()]
        } else {
            0
        };
        let to = if inside(&self.end) {
            self.end[text_path.len()]
        } else {
            len
        };
        (from.min(len), to.clamp(from.min(len), len))
    }
}

/// Markup of the selected content. Partially selected elements are written
/// with their tags around the selected part, marker anchors are skipped.
pub fn selected_markup(doc: &Document, position: &Position) -> String {
    let mut out = String::new();
    if position.is_collapsed() {
        return out;
    }
    let Some(span) = Span::of(doc, position) else {
        return out;
    };
    let Some(container) = common_ancestor(doc, position.start.node, position.end.node) else {
        return out;
    };
    if let Some(text) = doc.text(container) {
        let (from, to) = (position.start.offset, position.end.offset);
        let (from, to) = (from.min(to), from.max(to).min(text.len()));
        out.push_str(&html_escape::encode_text(text.get(from..to).unwrap_or_default()));
        return out;
    }
    let Some(path) = node_path(doc, container) else {
        return out;
    };
    write_selected(doc, container, &path, &span, &mut out);
    out
}

/// Deepest node containing both `a` and `b`.
pub fn common_ancestor(doc: &Document, a: NodeId, b: NodeId) -> Option<NodeId> {
    std::iter::once(a)
        .chain(doc.ancestors(a))
        .find(|&candidate| doc.contains(candidate, b))
}

fn write_selected(doc: &Document, node: NodeId, path: &[usize], span: &Span, out: &mut String) {
    for (index, &child) in doc.children(node).iter().enumerate() {
        let (before, after) = Span::child_points(path, index);
        if !span.overlaps(&before, &after) || is_marker(doc, child) {
            continue;
        }
        if span.covers(&before, &after) {
            out.push_str(&serialize_node(doc, child, false));
            continue;
        }
        if let Some(text) = doc.text(child) {
            let (from, to) = span.text_slice(&before, text.len());
            out.push_str(&html_escape::encode_text(&text[from..to]));
        } else if let Some(element) = doc.element(child) {
            write_open_tag(element, out);
            write_selected(doc, child, &before, span, out);
            write_close_tag(element, out);
        }
    }
}

/// Plain text of the selected content.
pub fn selected_text(doc: &Document, position: &Position) -> String {
    let Some(span) = Span::of(doc, position) else {
        return String::new();
    };
    let mut out = String::new();
    let Some(container) = common_ancestor(doc, position.start.node, position.end.node) else {
        return out;
    };
    if let Some(text) = doc.text(container) {
        let (from, to) = (position.start.offset, position.end.offset);
        let (from, to) = (from.min(to), from.max(to).min(text.len()));
        out.push_str(text.get(from..to).unwrap_or_default());
        return out;
    }
    if let Some(path) = node_path(doc, container) {
        collect_text(doc, container, &path, &span, &mut out);
    }
    out
}

fn collect_text(doc: &Document, node: NodeId, path: &[usize], span: &Span, out: &mut String) {
    for (index, &child) in doc.children(node).iter().enumerate() {
        let (before, after) = Span::child_points(path, index);
        if !span.overlaps(&before, &after) {
            continue;
        }
        match doc.text(child) {
            Some(text) => {
                let (from, to) = span.text_slice(&before, text.len());
                out.push_str(&text[from..to]);
            }
            None => collect_text(doc, child, &before, span, out),
        }
    }
}

/// Remove the selected content and return the collapsed boundary where it
/// used to start. Fully covered nodes are destroyed, partially covered text
/// is trimmed and partially covered elements keep their remaining children.
pub fn delete_contents(doc: &mut Document, position: &Position) -> Option<Boundary> {
    let position = ordered(doc, position)?;
    let start = normalize_text_start(doc, position.start);
    if position.is_collapsed() {
        return Some(start);
    }
    let span = Span::of(doc, &Position::new(start, position.end))?;

    let mut doomed = Vec::new();
    let mut trims = Vec::new();
    let root = doc.root();
    plan_delete(doc, root, &[], &span, &mut doomed, &mut trims);

    for (text, from, to) in trims {
        if let Some(value) = doc.text(text) {
            let mut value = value.to_string();
            value.replace_range(from..to, "");
            doc.set_text(text, &value);
        }
    }
    for node in doomed {
        doc.remove(node);
    }
    Some(start)
}

/// A boundary at the very start of a text node is expressed on its parent
/// instead, so it survives that text node being deleted.
fn normalize_text_start(doc: &Document, boundary: Boundary) -> Boundary {
    if boundary.offset == 0
        && doc.is_text(boundary.node)
        && let (Some(parent), Some(index)) = (doc.parent(boundary.node), doc.index_in_parent(boundary.node))
    {
        return Boundary::new(parent, index);
    }
    boundary
}

fn plan_delete(
    doc: &Document,
    node: NodeId,
    path: &[usize],
    span: &Span,
    doomed: &mut Vec<NodeId>,
    trims: &mut Vec<(NodeId, usize, usize)>,
) {
    for (index, &child) in doc.children(node).iter().enumerate() {
        let (before, after) = Span::child_points(path, index);
        if !span.overlaps(&before, &after) {
            continue;
        }
        if span.covers(&before, &after) {
            doomed.push(child);
            continue;
        }
        match doc.text(child) {
            Some(text) => {
                let (from, to) = span.text_slice(&before, text.len());
                if from < to {
                    trims.push((child, from, to));
                }
            }
            None => plan_delete(doc, child, &before, span, doomed, trims),
        }
    }
}

/// Insert `node` at a boundary, splitting a text container if needed.
/// Returns the `(parent, index)` the node ended up at.
pub fn insert_at(doc: &mut Document, at: Boundary, node: NodeId) -> Option<(NodeId, usize)> {
    let (parent, index) = split_at(doc, at)?;
    doc.insert_child(parent, index, node);
    Some((parent, index))
}

/// Resolve a boundary to an element-level insertion point, splitting a text
/// container in two when the boundary falls inside it.
pub fn split_at(doc: &mut Document, at: Boundary) -> Option<(NodeId, usize)> {
    let Some(len) = doc.text(at.node).map(str::len) else {
        return Some((at.node, at.offset.min(doc.node_len(at.node))));
    };
    let parent = doc.parent(at.node)?;
    let index = doc.index_in_parent(at.node)?;
    if at.offset == 0 {
        return Some((parent, index));
    }
    if at.offset < len {
        doc.split_text(at.node, at.offset)?;
    }
    Some((parent, index + 1))
}
