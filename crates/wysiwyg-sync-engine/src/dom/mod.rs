//! # Document tree
//!
//! The editing surface owns exactly one [`Document`]: an arena of text and
//! element nodes addressed by [`NodeId`]. Components mutate it in place
//! through the methods here; nothing else holds node references across a
//! mutation except through explicit [`Position`] values.
//!
//! Removed slots are reused for later nodes, but every reuse bumps the
//! slot's generation, so a stale `NodeId` simply stops resolving. Code
//! holding a position whose container was destroyed sees `None` from every
//! accessor rather than a different node.

pub mod cursor;
pub mod markup;
pub mod nesting;

use crate::selection::Position;

/// Tag used for the detached container that holds parsed markup before it is
/// spliced into the tree. Never serialized itself.
pub const FRAGMENT_TAG: &str = "#fragment";

/// Stable handle to a node in a [`Document`] arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    /// Indices of empty slots, reused last-freed first.
    free: Vec<usize>,
    root: NodeId,
    /// The live caret/selection, `None` when focus is elsewhere.
    pub(crate) selection: Option<Position>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document whose root is a `body` element.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            selection: None,
        };
        doc.root = doc.create_element("body");
        doc
    }

    /// Create a document and fill its root from markup.
    pub fn from_markup(markup: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        doc.set_inner_markup(root, markup);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ---- creation ----

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.data = Some(data);
        NodeId {
            index,
            generation: slot.generation,
        }
    }

    /// Number of arena slots, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_with(tag, Vec::new())
    }

    pub fn create_element_with(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        }))
    }

    /// Detached container for parsed markup.
    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: FRAGMENT_TAG.to_string(),
            attrs: Vec::new(),
        }))
    }

    /// Copy of an element's tag and attributes without its children.
    pub fn shallow_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let kind = self.kind(id)?.clone();
        Some(self.push(kind))
    }

    // ---- node access ----

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)?
            .data
            .as_ref()
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?
            .data
            .as_mut()
    }

    /// Whether the id still resolves to a node (attached or not).
    pub fn exists(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|data| &data.kind)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(_)))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    /// True when `id` is an element with one of the given tags.
    pub fn is_tag(&self, id: NodeId, tags: &[&str]) -> bool {
        self.tag(id).is_some_and(|tag| tags.contains(&tag))
    }

    /// Rename an element in place, keeping attributes and children.
    pub fn set_tag(&mut self, id: NodeId, tag: &str) {
        if let Some(element) = self.element_mut(id) {
            element.tag = tag.to_ascii_lowercase();
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    /// Length in bytes of a text node, or child count of an element.
    pub fn node_len(&self, id: NodeId) -> usize {
        match self.data(id) {
            Some(NodeData {
                kind: NodeKind::Text(text),
                ..
            }) => text.len(),
            Some(data) => data.children.len(),
            None => 0,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) {
        if let Some(NodeData {
            kind: NodeKind::Text(text),
            ..
        }) = self.data_mut(id)
        {
            value.clone_into(text);
        }
    }

    pub fn insert_text(&mut self, id: NodeId, offset: usize, value: &str) {
        if let Some(NodeData {
            kind: NodeKind::Text(text),
            ..
        }) = self.data_mut(id)
        {
            let offset = floor_char_boundary(text, offset);
            text.insert_str(offset, value);
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            match element.attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => value.clone_into(existing),
                None => element.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.retain(|(key, _)| key != name);
        }
    }

    pub fn retain_attrs(&mut self, id: NodeId, mut keep: impl FnMut(&str, &str) -> bool) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.retain(|(key, value)| keep(key, value));
        }
    }

    // ---- structure ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map_or(&[], |data| data.children.as_slice())
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child(parent, index + 1)
    }

    /// Ancestors from the parent up to the top of the (sub)tree.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// Whether `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.exists(id) && self.contains(self.root, id)
    }

    /// Nodes of the subtree in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// The node after `id` in document order, staying inside `within`.
    pub fn next_in_order(&self, id: NodeId, within: NodeId) -> Option<NodeId> {
        if let Some(first) = self.first_child(id) {
            return Some(first);
        }
        let mut current = id;
        while current != within {
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
        None
    }

    /// The node before `id` in document order, staying inside `within`.
    pub fn previous_in_order(&self, id: NodeId, within: NodeId) -> Option<NodeId> {
        if id == within {
            return None;
        }
        match self.previous_sibling(id) {
            Some(mut node) => {
                while let Some(last) = self.last_child(node) {
                    node = last;
                }
                Some(node)
            }
            None => self.parent(id).filter(|&parent| parent != within),
        }
    }

    /// Concatenated text of every text node in the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// First descendant element (or `id` itself) carrying `name=value`.
    pub fn find_by_attr(&self, id: NodeId, name: &str, value: &str) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .find(|&node| self.attr(node, name) == Some(value))
    }

    /// Detach `child` from wherever it is and insert it at `index` of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.exists(parent) || !self.exists(child) || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(data) = self.data_mut(parent) {
            let index = index.min(data.children.len());
            data.children.insert(index, child);
        }
        if let Some(data) = self.data_mut(child) {
            data.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference)) {
            self.insert_child(parent, index, node);
        }
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference)) {
            self.insert_child(parent, index + 1, node);
        }
    }

    /// Unlink a node from its parent. The subtree stays alive in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(data) = self.data_mut(parent) {
            data.children.retain(|&child| child != id);
        }
        if let Some(data) = self.data_mut(id) {
            data.parent = None;
        }
    }

    /// Detach and destroy a node with its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            if let Some(slot) = self.slots.get_mut(node.index)
                && slot.generation == node.generation
                && slot.data.take().is_some()
            {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
    }

    /// Detach every child of `id`, returning them in order.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = self.children(id).to_vec();
        for &child in &children {
            self.detach(child);
        }
        children
    }

    /// Move all children of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        for child in self.take_children(from) {
            self.append_child(to, child);
        }
    }

    /// Replace `old` with `new` in the tree and destroy `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        self.insert_before(old, new);
        self.remove(old);
    }

    /// Split a text node at `offset`, returning the new node holding the
    /// right-hand side. The new node is inserted right after the original.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?;
        let offset = floor_char_boundary(text, offset);
        let right = text[offset..].to_string();
        let left = text[..offset].to_string();
        self.set_text(id, &left);
        let new = self.create_text(&right);
        if self.parent(id).is_some() {
            self.insert_after(id, new);
        }
        Some(new)
    }

    /// Append `right`'s text to `left` and destroy `right`. Returns the length
    /// of `left` before the merge.
    pub fn merge_text(&mut self, left: NodeId, right: NodeId) -> Option<usize> {
        let appended = self.text(right)?.to_string();
        let left_len = self.text(left)?.len();
        self.insert_text(left, left_len, &appended);
        self.remove(right);
        Some(left_len)
    }

    /// Replace the children of `id` with the parsed markup.
    pub fn set_inner_markup(&mut self, id: NodeId, markup_src: &str) {
        for child in self.take_children(id) {
            self.remove(child);
        }
        let fragment = markup::parse_fragment(self, markup_src);
        self.move_children(fragment, id);
        self.remove(fragment);
    }

    /// Markup of the node's children with marker anchors left out.
    pub fn inner_markup(&self, id: NodeId) -> String {
        markup::serialize_children(self, id, false)
    }

    /// Markup of the whole document body, marker anchors left out.
    pub fn markup(&self) -> String {
        self.inner_markup(self.root)
    }

    // ---- live selection ----

    pub fn selection(&self) -> Option<&Position> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Position>) {
        self.selection = selection;
    }

    /// Place a collapsed caret.
    pub fn set_caret(&mut self, node: NodeId, offset: usize) {
        self.selection = Some(Position::caret(node, offset));
    }
}

/// Largest char boundary not greater than `offset`.
pub(crate) fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_document_has_empty_body() {
        let doc = Document::new();
        assert_eq!(doc.tag(doc.root()), Some("body"));
        assert!(doc.children(doc.root()).is_empty());
        assert_eq!(doc.markup(), "");
    }

    #[test]
    fn split_and_merge_text() {
        let mut doc = Document::from_markup("<p>hello world</p>");
        let p = doc.first_child(doc.root()).unwrap();
        let text = doc.first_child(p).unwrap();

        let right = doc.split_text(text, 5).unwrap();
        assert_eq!(doc.text(text), Some("hello"));
        assert_eq!(doc.text(right), Some(" world"));
        assert_eq!(doc.children(p), &[text, right]);

        assert_eq!(doc.merge_text(text, right), Some(5));
        assert_eq!(doc.text(text), Some("hello world"));
        assert!(!doc.exists(right));
    }

    #[test]
    fn split_text_respects_char_boundaries() {
        let mut doc = Document::new();
        let text = doc.create_text("añb");
        doc.append_child(doc.root(), text);

        // offset 2 falls inside the two-byte 'ñ'
        let right = doc.split_text(text, 2).unwrap();
        assert_eq!(doc.text(text), Some("a"));
        assert_eq!(doc.text(right), Some("ñb"));
    }

    #[test]
    fn removed_ids_stop_resolving() {
        let mut doc = Document::from_markup("<p><b>x</b></p>");
        let p = doc.first_child(doc.root()).unwrap();
        let b = doc.first_child(p).unwrap();
        let x = doc.first_child(b).unwrap();

        doc.remove(p);

        assert!(!doc.exists(p));
        assert!(!doc.exists(b));
        assert!(!doc.exists(x));
        assert_eq!(doc.text(x), None);
        assert!(doc.children(doc.root()).is_empty());
    }

    #[test]
    fn removed_slots_are_reused_without_reviving_stale_ids() {
        let mut doc = Document::from_markup("<p>a</p>");
        let p = doc.first_child(doc.root()).unwrap();
        let a = doc.first_child(p).unwrap();
        let slots = doc.slot_count();

        doc.remove(a);
        let b = doc.create_text("b");
        doc.append_child(p, b);

        assert_eq!(doc.slot_count(), slots);
        assert_ne!(a, b);
        assert_eq!(doc.text(a), None);
        assert!(!doc.exists(a));
        assert_eq!(doc.markup(), "<p>b</p>");
    }

    #[test]
    fn insert_child_refuses_cycles() {
        let mut doc = Document::from_markup("<div><p>x</p></div>");
        let div = doc.first_child(doc.root()).unwrap();
        let p = doc.first_child(div).unwrap();

        doc.append_child(p, div);

        assert_eq!(doc.parent(p), Some(div));
        assert_eq!(doc.markup(), "<div><p>x</p></div>");
    }

    #[test]
    fn document_order_walks() {
        let doc = Document::from_markup("<p>a<b>b</b></p><p>c</p>");
        let root = doc.root();
        let order: Vec<String> = doc
            .descendants(root)
            .into_iter()
            .map(|n| {
                doc.text(n)
                    .map(str::to_string)
                    .unwrap_or_else(|| doc.tag(n).unwrap().to_string())
            })
            .collect();
        assert_eq!(order, vec!["p", "a", "b", "b", "p", "c"]);

        let c = doc.first_child(doc.child(root, 1).unwrap()).unwrap();
        let before_c = doc.previous_in_order(c, root).unwrap();
        assert_eq!(doc.tag(before_c), Some("p"));
        let before_that = doc.previous_in_order(before_c, root).unwrap();
        assert_eq!(doc.text(before_that), Some("b"));

        let first_p = doc.first_child(root).unwrap();
        assert_eq!(doc.previous_in_order(first_p, root), None);
        assert_eq!(doc.next_in_order(c, root), None);
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let doc = Document::from_markup("<p>one <i>two</i> three</p>");
        assert_eq!(doc.text_content(doc.root()), "one two three");
    }
}
