//! Stripping active content out of pasted markup.

use crate::dom::{Document, NodeId};

/// Elements dropped together with their content.
const DROPPED_TAGS: &[&str] = &["script", "style", "iframe", "object", "embed"];

/// Attributes holding a URL that could run script.
const URL_ATTRS: &[&str] = &["href", "src", "action", "formaction"];

/// Remove scripting from the subtree under `root`: dangerous elements, event
/// handler attributes and `javascript:` URLs.
pub fn sanitize(doc: &mut Document, root: NodeId) {
    for node in doc.descendants(root) {
        if !doc.exists(node) || !doc.is_element(node) {
            continue;
        }
        if doc.is_tag(node, DROPPED_TAGS) {
            doc.remove(node);
            continue;
        }
        doc.retain_attrs(node, |name, value| {
            !name.starts_with("on") && !(URL_ATTRS.contains(&name) && is_script_url(value))
        });
    }
}

fn is_script_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take("javascript:".len())
        .collect();
    compact.eq_ignore_ascii_case("javascript:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sanitized(markup: &str) -> String {
        let mut doc = Document::new();
        let staging = doc.create_element("div");
        doc.set_inner_markup(staging, markup);
        sanitize(&mut doc, staging);
        doc.inner_markup(staging)
    }

    #[rstest]
    #[case("<p>ok</p><script>alert(1)</script>", "<p>ok</p>")]
    #[case("<style>p{}</style><b>x</b>", "<b>x</b>")]
    #[case("<iframe src=\"x\"></iframe>y", "y")]
    #[case("<img src=\"a.png\" onerror=\"boom()\">", "<img src=\"a.png\">")]
    #[case("<a href=\" JavaScript:alert(1)\">l</a>", "<a>l</a>")]
    #[case("<a href=\"https://example.com\">l</a>", "<a href=\"https://example.com\">l</a>")]
    fn strips_active_content(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitized(input), expected);
    }
}
