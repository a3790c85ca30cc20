//! Text on either side of the caret, read across the text nodes of the
//! caret's block as if it were one string.
//!
//! Formatting splits typed text over many nodes (`<b>:</b>)` still reads as
//! `:)`), so keyword matching works on this flattened view and maps the
//! matched span back onto real node boundaries afterwards.

use super::{Boundary, Position};
use crate::dom::nesting::first_block_parent;
use crate::dom::{Document, NodeId, floor_char_boundary};

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    node: NodeId,
    /// Byte offset in the node where the segment starts.
    node_start: usize,
    /// Byte offset in the flattened text where the segment starts.
    flat_start: usize,
    len: usize,
}

impl Segment {
    fn flat_end(&self) -> usize {
        self.flat_start + self.len
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OuterText {
    /// Collected text, the part before the caret followed by the part after it.
    pub text: String,
    /// Byte index of the caret in `text`.
    pub caret: usize,
    /// More text exists in the block before the collected part.
    pub truncated_before: bool,
    /// More text exists in the block after the collected part.
    pub truncated_after: bool,
    segments: Vec<Segment>,
}

impl OuterText {
    /// Collect up to `before` chars preceding the caret and up to `after`
    /// chars following it, without leaving the caret's block.
    pub fn around(doc: &Document, caret: Boundary, before: usize, after: usize) -> Option<Self> {
        if !doc.is_attached(caret.node) {
            return None;
        }
        let block = first_block_parent(doc, caret.node).unwrap_or_else(|| doc.root());

        // (node, start offset in node, text), nearest to the caret first.
        // Each side keeps one char beyond its limit so truncation shows.
        let mut left: Vec<(NodeId, usize, &str)> = Vec::new();
        let mut right: Vec<(NodeId, usize, &str)> = Vec::new();
        let mut left_chars = 0;
        let mut right_chars = 0;

        let (mut back, mut forward) = match doc.text(caret.node) {
            Some(text) => {
                let offset = floor_char_boundary(text, caret.offset);
                let (start, count) = tail(&text[..offset], before + 1);
                left.push((caret.node, start, &text[start..offset]));
                left_chars += count;
                let (end, count) = head(&text[offset..], after + 1);
                right.push((caret.node, offset, &text[offset..offset + end]));
                right_chars += count;
                (
                    doc.previous_in_order(caret.node, block),
                    doc.next_in_order(caret.node, block),
                )
            }
            None => {
                let back = match caret.offset.checked_sub(1).and_then(|i| doc.child(caret.node, i)) {
                    Some(previous) => Some(deepest_last(doc, previous)),
                    None => doc.previous_in_order(caret.node, block),
                };
                let forward = doc
                    .child(caret.node, caret.offset)
                    .or_else(|| next_after_subtree(doc, caret.node, block));
                (back, forward)
            }
        };

        while left_chars <= before
            && let Some(node) = back
        {
            if let Some(text) = doc.text(node) {
                let (start, count) = tail(text, before + 1 - left_chars);
                left_chars += count;
                left.push((node, start, &text[start..]));
            }
            back = doc.previous_in_order(node, block);
        }

        while right_chars <= after
            && let Some(node) = forward
        {
            if let Some(text) = doc.text(node) {
                let (end, count) = head(text, after + 1 - right_chars);
                right_chars += count;
                right.push((node, 0, &text[..end]));
            }
            forward = doc.next_in_order(node, block);
        }

        let mut outer = Self {
            text: String::new(),
            caret: 0,
            truncated_before: false,
            truncated_after: false,
            segments: Vec::new(),
        };
        for (node, node_start, text) in left.into_iter().rev() {
            outer.push_segment(node, node_start, text);
        }
        outer.caret = outer.text.len();
        for (node, node_start, text) in right {
            outer.push_segment(node, node_start, text);
        }

        if left_chars > before {
            outer.trim_front(left_chars - before);
        }
        if right_chars > after {
            outer.trim_back(after);
        }
        Some(outer)
    }

    fn push_segment(&mut self, node: NodeId, node_start: usize, text: &str) {
        self.segments.push(Segment {
            node,
            node_start,
            flat_start: self.text.len(),
            len: text.len(),
        });
        self.text.push_str(text);
    }

    /// Drop the first `chars` chars.
    fn trim_front(&mut self, chars: usize) {
        let cut = self
            .text
            .char_indices()
            .nth(chars)
            .map_or(self.caret, |(index, _)| index.min(self.caret));
        self.truncated_before = true;
        self.text.drain(..cut);
        self.caret -= cut;
        self.segments.retain_mut(|segment| {
            if segment.flat_end() < cut || (segment.flat_end() == cut && segment.flat_start < cut) {
                return false;
            }
            if segment.flat_start < cut {
                let skipped = cut - segment.flat_start;
                segment.node_start += skipped;
                segment.len -= skipped;
                segment.flat_start = cut;
            }
            segment.flat_start -= cut;
            true
        });
    }

    /// Keep only `chars` chars after the caret.
    fn trim_back(&mut self, chars: usize) {
        let end = self.text[self.caret..]
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(index, _)| self.caret + index);
        self.truncated_after = true;
        self.text.truncate(end);
        self.segments.retain_mut(|segment| {
            if segment.flat_start > end || (segment.flat_start == end && segment.len > 0 && end > self.caret) {
                return false;
            }
            segment.len = segment.len.min(end - segment.flat_start);
            true
        });
    }

    /// Text before the caret.
    pub fn before_caret(&self) -> &str {
        &self.text[..self.caret]
    }

    /// Text after the caret.
    pub fn after_caret(&self) -> &str {
        &self.text[self.caret..]
    }

    /// Map the flattened byte span `from..to` back onto the tree.
    pub fn span(&self, from: usize, to: usize) -> Option<Position> {
        let start = self
            .segments
            .iter()
            .find(|segment| segment.flat_start <= from && from < segment.flat_end())
            .or_else(|| {
                self.segments
                    .iter()
                    .find(|segment| segment.flat_start <= from && from <= segment.flat_end())
            })?;
        let end = self
            .segments
            .iter()
            .find(|segment| segment.flat_start < to && to <= segment.flat_end())
            .or_else(|| {
                self.segments
                    .iter()
                    .find(|segment| segment.flat_start <= to && to <= segment.flat_end())
            })?;
        Some(Position::new(
            Boundary::new(start.node, start.node_start + from - start.flat_start),
            Boundary::new(end.node, end.node_start + to - end.flat_start),
        ))
    }
}

/// Byte offset where the last `chars` chars of `text` start, and how many
/// chars that is.
fn tail(text: &str, chars: usize) -> (usize, usize) {
    let mut start = text.len();
    let mut count = 0;
    for (index, _) in text.char_indices().rev().take(chars) {
        start = index;
        count += 1;
    }
    (start, count)
}

/// Byte offset where the first `chars` chars of `text` end, and how many
/// chars that is.
fn head(text: &str, chars: usize) -> (usize, usize) {
    let mut end = 0;
    let mut count = 0;
    for (index, c) in text.char_indices().take(chars) {
        end = index + c.len_utf8();
        count += 1;
    }
    (end, count)
}

fn deepest_last(doc: &Document, mut node: NodeId) -> NodeId {
    while let Some(last) = doc.last_child(node) {
        node = last;
    }
    node
}

/// First node after the whole subtree of `node`, staying inside `within`.
fn next_after_subtree(doc: &Document, node: NodeId, within: NodeId) -> Option<NodeId> {
    let mut current = node;
    while current != within {
        if let Some(next) = doc.next_sibling(current) {
            return Some(next);
        }
        current = doc.parent(current)?;
    }
    None
}
