//! Regions whose text is kept exactly as typed.

use crate::dom::{Document, NodeId};

/// Attribute that marks any element as verbatim.
pub const VERBATIM_ATTR: &str = "data-verbatim";

/// Decides whether an element's content must never be rewritten by keyword
/// substitution.
pub trait VerbatimPredicate {
    fn is_verbatim(&self, doc: &Document, node: NodeId) -> bool;
}

/// `code` and `pre` elements plus anything carrying `data-verbatim`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVerbatim;

impl VerbatimPredicate for DefaultVerbatim {
    fn is_verbatim(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_tag(node, &["code", "pre"]) || doc.attr(node, VERBATIM_ATTR).is_some()
    }
}

impl<F> VerbatimPredicate for F
where
    F: Fn(&Document, NodeId) -> bool,
{
    fn is_verbatim(&self, doc: &Document, node: NodeId) -> bool {
        self(doc, node)
    }
}

/// Whether `node` or any of its ancestors is verbatim.
pub fn in_verbatim(doc: &Document, node: NodeId, predicate: &dyn VerbatimPredicate) -> bool {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .any(|candidate| doc.is_element(candidate) && predicate.is_verbatim(doc, candidate))
}
