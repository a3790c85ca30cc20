//! Block/inline classification and repair of illegal nesting.

use super::{Document, NodeId};

/// Elements laid out as blocks.
pub const BLOCK_TAGS: &[&str] = &[
    "body", "hr", "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "address", "pre", "form",
    "table", "tbody", "thead", "tfoot", "th", "tr", "td", "li", "ol", "ul", "blockquote",
    "center", "details", "section", "article", "aside", "nav", "main", "header", "hgroup",
    "footer", "fieldset", "dl", "dt", "dd", "figure", "figcaption",
];

/// Elements that cannot hold children.
const CHILDLESS_TAGS: &[&str] = &[
    "iframe", "area", "base", "basefont", "br", "col", "frame", "hr", "img", "input", "wbr",
    "isindex", "link", "meta", "param", "command", "embed", "keygen", "source", "track",
    "object",
];

/// Whether a node flows inline. Text nodes and missing nodes count as inline.
/// With `code_as_block` a `code` element is treated as a block.
pub fn is_inline(doc: &Document, id: NodeId, code_as_block: bool) -> bool {
    let Some(tag) = doc.tag(id) else {
        return true;
    };
    if code_as_block && tag == "code" {
        return false;
    }
    !BLOCK_TAGS.contains(&tag)
}

pub fn can_have_children(doc: &Document, id: NodeId) -> bool {
    match doc.tag(id) {
        Some(tag) => !CHILDLESS_TAGS.contains(&tag),
        None => false,
    }
}

/// Empty text, or an element that could hold children but holds nothing
/// other than empty nodes.
pub fn is_empty(doc: &Document, id: NodeId) -> bool {
    if let Some(text) = doc.text(id) {
        return text.is_empty();
    }
    can_have_children(doc, id) && doc.children(id).iter().all(|&child| is_empty(doc, child))
}

/// Nearest block element at or above `node`.
pub fn first_block_parent(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(candidate) = current {
        if doc.is_element(candidate) && !is_inline(doc, candidate, true) {
            return Some(candidate);
        }
        current = doc.parent(candidate);
    }
    None
}

/// Repair the subtree under `root`:
///
/// - a block inside an inline element, or inside a `p`, is hoisted out to sit
///   beside its outermost inline (or `p`) ancestor. The content before it is
///   split off into a copy of that ancestor and the inline ancestors are
///   re-created inside the block so styling carries over.
/// - a list directly inside a list is moved into the preceding `li`, which
///   is created when missing.
pub fn fix_nesting(doc: &mut Document, root: NodeId) {
    for node in doc.descendants(root) {
        if !doc.contains(root, node) || !doc.is_element(node) {
            continue;
        }
        let is_block = !is_inline(doc, node, true);
        let Some(parent) = doc.parent(node) else {
            continue;
        };

        if is_block && parent != root && needs_hoisting(doc, parent) {
            hoist_block(doc, root, node);
        }

        if is_block && doc.is_tag(node, &["ul", "ol"]) {
            if let Some(parent) = doc.parent(node)
                && doc.is_tag(parent, &["ul", "ol"])
            {
                wrap_nested_list(doc, node);
            }
        }
    }
}

fn needs_hoisting(doc: &Document, parent: NodeId) -> bool {
    is_inline(doc, parent, true) || doc.is_tag(parent, &["p"])
}

fn hoist_block(doc: &mut Document, root: NodeId, node: NodeId) {
    let mut outermost = node;
    while let Some(parent) = doc.parent(outermost) {
        if parent == root || !needs_hoisting(doc, parent) {
            break;
        }
        outermost = parent;
    }
    if outermost == node {
        return;
    }

    let before = extract_before(doc, outermost, node);

    // re-create the inline styling around the block's own content
    let mut ancestor = doc.parent(node);
    while let Some(inline) = ancestor {
        if !doc.contains(outermost, inline) || !is_inline(doc, inline, true) {
            break;
        }
        if let Some(clone) = doc.shallow_clone(inline) {
            doc.move_children(node, clone);
            doc.append_child(node, clone);
        }
        ancestor = doc.parent(inline);
    }

    doc.insert_before(outermost, node);
    if let Some(before) = before {
        if is_empty(doc, before) {
            doc.remove(before);
        } else {
            doc.insert_before(node, before);
        }
    }
    if is_empty(doc, outermost) {
        doc.remove(outermost);
    }
}

/// Move everything in `ancestor` that comes before `target` into a shallow
/// copy of `ancestor`, recreating the intermediate elements on the way down.
fn extract_before(doc: &mut Document, ancestor: NodeId, target: NodeId) -> Option<NodeId> {
    let copy = doc.shallow_clone(ancestor)?;
    for child in doc.children(ancestor).to_vec() {
        if child == target {
            break;
        }
        if doc.contains(child, target) {
            if let Some(inner) = extract_before(doc, child, target) {
                doc.append_child(copy, inner);
            }
            break;
        }
        doc.append_child(copy, child);
    }
    Some(copy)
}

fn wrap_nested_list(doc: &mut Document, list: NodeId) {
    let mut previous = doc.previous_sibling(list);
    while let Some(sibling) = previous {
        if doc.is_element(sibling) {
            break;
        }
        previous = doc.previous_sibling(sibling);
    }

    let li = match previous {
        Some(sibling) if doc.is_tag(sibling, &["li"]) => sibling,
        _ => {
            let li = doc.create_element("li");
            doc.insert_before(list, li);
            li
        }
    };
    doc.append_child(li, list);
}
