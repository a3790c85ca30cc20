//! Tolerant markup reader and the serializer for the document tree.
//!
//! The reader only has to understand the markup this crate writes and what
//! typically turns up on a clipboard: start/end/self-closing tags, quoted,
//! unquoted and boolean attributes, comments, character references and void
//! elements. Stray end tags are dropped and anything left open is closed at
//! the end of input.

use super::cursor::Cursor;
use super::{Document, Element, FRAGMENT_TAG, NodeId, NodeKind};
use crate::selection::is_marker;

/// Elements that never have children or a closing tag.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is read as plain text up to the matching end tag.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

enum Token<'a> {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Comment,
    Text(&'a str),
}

/// Parse `input` into a new detached fragment container and return it.
pub fn parse_fragment(doc: &mut Document, input: &str) -> NodeId {
    let fragment = doc.create_fragment();
    let mut stack = vec![fragment];
    let mut cur = Cursor::new(input);
    let mut text_start = 0;

    while !cur.eof() {
        if cur.peek() == Some(b'<') {
            let tag_start = cur.i;
            if let Some(token) = try_parse_tag(&mut cur) {
                push_text(doc, &stack, &input[text_start..tag_start]);
                apply_token(doc, &mut stack, &mut cur, token);
                text_start = cur.i;
                continue;
            }
        }
        cur.bump();
    }

    push_text(doc, &stack, &input[text_start..]);
    fragment
}

fn push_text(doc: &mut Document, stack: &[NodeId], raw: &str) {
    if raw.is_empty() {
        return;
    }
    let Some(&parent) = stack.last() else {
        return;
    };
    let decoded = html_escape::decode_html_entities(raw);
    // adjacent text (e.g. around a dropped comment) joins the previous node
    if let Some(last) = doc.last_child(parent)
        && doc.is_text(last)
    {
        let len = doc.node_len(last);
        doc.insert_text(last, len, &decoded);
        return;
    }
    let text = doc.create_text(&decoded);
    doc.append_child(parent, text);
}

fn apply_token(doc: &mut Document, stack: &mut Vec<NodeId>, cur: &mut Cursor<'_>, token: Token<'_>) {
    match token {
        Token::Comment => {}
        Token::Text(raw) => push_text(doc, stack, raw),
        Token::Start {
            name,
            attrs,
            self_closing,
        } => {
            let Some(&parent) = stack.last() else {
                return;
            };
            let element = doc.create_element_with(&name, attrs);
            doc.append_child(parent, element);

            if RAW_TEXT_TAGS.contains(&name.as_str()) && !self_closing {
                let body = read_raw_text(cur, &name);
                if !body.is_empty() {
                    let text = doc.create_text(body);
                    doc.append_child(element, text);
                }
            } else if !self_closing && !VOID_TAGS.contains(&name.as_str()) {
                stack.push(element);
            }
        }
        Token::End { name } => {
            // index 0 is the fragment itself and never closes
            if let Some(open) = stack
                .iter()
                .skip(1)
                .rposition(|&node| doc.tag(node) == Some(name.as_str()))
            {
                stack.truncate(open + 1);
            }
        }
    }
}

fn read_raw_text<'a>(cur: &mut Cursor<'a>, name: &str) -> &'a str {
    let start = cur.i;
    let close = format!("</{name}");
    while !cur.eof() {
        if cur.starts_with_ignore_case(close.as_bytes()) {
            let body = &cur.s[start..cur.i];
            cur.eat_until(">");
            return body;
        }
        cur.bump();
    }
    &cur.s[start..]
}

/// Attempts to read a tag, comment or doctype at `<`.
///
/// On failure the cursor is restored and the `<` is treated as text.
fn try_parse_tag<'a>(cur: &mut Cursor<'a>) -> Option<Token<'a>> {
    let saved = cur.clone();

    if cur.starts_with_ignore_case(b"<!--") {
        cur.bump_n(4);
        cur.eat_until("-->");
        return Some(Token::Comment);
    }
    if cur.starts_with_ignore_case(b"<!") || cur.starts_with_ignore_case(b"<?") {
        cur.eat_until(">");
        return Some(Token::Comment);
    }

    cur.bump(); // <
    let closing = cur.peek() == Some(b'/');
    if closing {
        cur.bump();
    }

    if !cur.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
        *cur = saved;
        return None;
    }
    let name = cur
        .eat_while(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b':')
        .to_ascii_lowercase();

    if closing {
        cur.eat_until(">");
        return Some(Token::End { name });
    }

    let mut attrs = Vec::new();
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => {
                // unterminated tag: everything from `<` is text
                let text = &saved.s[saved.i..];
                return Some(Token::Text(text));
            }
            Some(b'>') => {
                cur.bump();
                return Some(Token::Start {
                    name,
                    attrs,
                    self_closing: false,
                });
            }
            Some(b'/') => {
                cur.bump();
                cur.skip_whitespace();
                if cur.peek() == Some(b'>') {
                    cur.bump();
                    return Some(Token::Start {
                        name,
                        attrs,
                        self_closing: true,
                    });
                }
            }
            Some(_) => {
                if let Some(attr) = parse_attribute(cur) {
                    if !attrs.iter().any(|(key, _): &(String, String)| *key == attr.0) {
                        attrs.push(attr);
                    }
                } else {
                    cur.bump();
                }
            }
        }
    }
}

fn parse_attribute(cur: &mut Cursor<'_>) -> Option<(String, String)> {
    let name = cur
        .eat_while(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\''))
        .to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    cur.skip_whitespace();
    if cur.peek() != Some(b'=') {
        return Some((name, String::new()));
    }
    cur.bump();
    cur.skip_whitespace();

    let raw = match cur.peek() {
        Some(quote @ (b'"' | b'\'')) => {
            cur.bump();
            let quote = if quote == b'"' { "\"" } else { "'" };
            cur.eat_until(quote)
        }
        _ => cur.eat_while(|b| !b.is_ascii_whitespace() && b != b'>'),
    };
    Some((name, html_escape::decode_html_entities(raw).into_owned()))
}

/// Serialize the children of `id`. Marker anchors are written only when
/// `include_markers` is set.
pub fn serialize_children(doc: &Document, id: NodeId, include_markers: bool) -> String {
    let mut out = String::new();
    for &child in doc.children(id) {
        write_node(doc, child, include_markers, &mut out);
    }
    out
}

/// Serialize a node including its own tag.
pub fn serialize_node(doc: &Document, id: NodeId, include_markers: bool) -> String {
    let mut out = String::new();
    write_node(doc, id, include_markers, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, include_markers: bool, out: &mut String) {
    let Some(kind) = doc.kind(id) else {
        return;
    };
    match kind {
        NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
        NodeKind::Element(element) => {
            if !include_markers && is_marker(doc, id) {
                return;
            }
            if element.tag == FRAGMENT_TAG {
                for &child in doc.children(id) {
                    write_node(doc, child, include_markers, out);
                }
                return;
            }
            write_open_tag(element, out);
            if VOID_TAGS.contains(&element.tag.as_str()) {
                return;
            }
            for &child in doc.children(id) {
                write_node(doc, child, include_markers, out);
            }
            write_close_tag(element, out);
        }
    }
}

pub(crate) fn write_open_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (key, value) in &element.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');
}

/// Closing tag, or nothing for void elements.
pub(crate) fn write_close_tag(element: &Element, out: &mut String) {
    if VOID_TAGS.contains(&element.tag.as_str()) {
        return;
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn roundtrip(markup: &str) -> String {
        Document::from_markup(markup).markup()
    }

    #[rstest]
    #[case("<p>plain</p>", "<p>plain</p>")]
    #[case("<P CLASS=x>a</P>", "<p class=\"x\">a</p>")]
    #[case("a<br>b<br/>c", "a<br>b<br>c")]
    #[case("<img src='a.png' alt=\":)\">", "<img src=\"a.png\" alt=\":)\">")]
    #[case("<input disabled>", "<input disabled=\"\">")]
    #[case("x<!-- gone -->y", "xy")]
    #[case("<!DOCTYPE html><p>d</p>", "<p>d</p>")]
    #[case("<b>unclosed", "<b>unclosed</b>")]
    #[case("stray</i>end", "strayend")]
    #[case("<b><i>x</b>y", "<b><i>x</i></b>y")]
    #[case("1 < 2 & 3", "1 &lt; 2 &amp; 3")]
    #[case("&lt;b&gt; &amp;amp;", "&lt;b&gt; &amp;amp;")]
    #[case("<a title=\"say &quot;hi&quot;\">q</a>", "<a title=\"say &quot;hi&quot;\">q</a>")]
    #[case("<p>unterminated <b", "<p>unterminated &lt;b</p>")]
    fn reads_and_writes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(roundtrip(input), expected);
    }

    #[test]
    fn script_body_is_raw_text() {
        let mut doc = Document::new();
        let fragment = parse_fragment(&mut doc, "<script>if (a < b) {}</script>after");
        let script = doc.first_child(fragment).unwrap();

        assert_eq!(doc.tag(script), Some("script"));
        assert_eq!(doc.text_content(script), "if (a < b) {}");
        assert_eq!(doc.text(doc.child(fragment, 1).unwrap()), Some("after"));
    }

    #[test]
    fn fragment_container_is_transparent() {
        let mut doc = Document::new();
        let fragment = parse_fragment(&mut doc, "<b>x</b>y");
        assert_eq!(serialize_node(&doc, fragment, false), "<b>x</b>y");
    }

    #[test]
    fn non_ascii_text_survives() {
        assert_eq!(roundtrip("<p>naïve ☃ text</p>"), "<p>naïve ☃ text</p>");
    }
}
