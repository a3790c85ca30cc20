//! # Paste normalization
//!
//! A paste arrives either as structured clipboard data the host can read
//! synchronously, or not at all, in which case the native paste is let
//! through into an emptied editing root and read back on the next tick.
//! Either way the result becomes a [`PastePayload`] that is run through the
//! hook pipeline in [`PasteNormalizer::normalize`] before the session
//! inserts it.

pub mod sanitize;

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::dom::nesting::fix_nesting;
use crate::dom::{Document, NodeId};
use crate::error::EngineError;
use crate::hooks::{self, HookPayload, HookRegistry};

pub use sanitize::sanitize;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

/// A file item on the clipboard. `bytes` is `None` when the host could not
/// read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardFile {
    pub mime: String,
    pub bytes: Option<Vec<u8>>,
}

/// Structured clipboard content: named formats in the order the host
/// reported them, plus any file items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardData {
    formats: Vec<(String, String)>,
    files: Vec<ClipboardFile>,
}

impl ClipboardData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, mime: &str, data: &str) -> Self {
        self.formats.push((mime.to_string(), data.to_string()));
        self
    }

    pub fn with_file(mut self, mime: &str, bytes: Option<Vec<u8>>) -> Self {
        self.files.push(ClipboardFile {
            mime: mime.to_string(),
            bytes,
        });
        self
    }

    pub fn get(&self, mime: &str) -> Option<&str> {
        self.formats
            .iter()
            .find(|(name, _)| name == mime)
            .map(|(_, data)| data.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty() && self.files.is_empty()
    }
}

/// How a paste reached the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteEvent {
    Clipboard(ClipboardData),
    /// No structured data; the host performs the native paste itself.
    Native,
}

/// Content of one paste, keyed by format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PastePayload {
    pub formats: BTreeMap<String, String>,
    pub text: Option<String>,
    pub html: Option<String>,
}

impl PastePayload {
    pub fn from_formats(formats: BTreeMap<String, String>) -> Self {
        Self {
            text: formats.get(TEXT_PLAIN).cloned(),
            html: formats.get(TEXT_HTML).cloned(),
            formats,
        }
    }

    pub fn from_html(html: String) -> Self {
        Self::from_formats(BTreeMap::from([(TEXT_HTML.to_string(), html)]))
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_formats(BTreeMap::from([(TEXT_PLAIN.to_string(), text.to_string())]))
    }
}

/// Result of handing a paste event to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOutcome {
    /// Content was inserted and the native paste must be suppressed.
    Inserted,
    /// The native paste must go ahead; a merge runs on the next tick.
    NativeAllowed,
    /// A merge is already pending and will pick this paste up as well.
    AlreadyPending,
    /// The content could not be inserted; the native paste must still be
    /// suppressed.
    Dropped,
}

/// Single-flight state of the fallback path.
#[derive(Debug, Clone, Default)]
pub struct PasteNormalizer {
    held: Option<NodeId>,
}

impl PasteNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.held.is_some()
    }

    /// Read a structured clipboard. An image without an HTML format becomes
    /// an embedded image; unreadable or empty data gives `None`.
    pub fn payload_from_clipboard(data: &ClipboardData) -> Option<PastePayload> {
        if data.get(TEXT_HTML).is_none()
            && let Some((mime, bytes)) = data.files.iter().find_map(|file| {
                let bytes = file.bytes.as_ref()?;
                file.mime.starts_with("image/").then_some((&file.mime, bytes))
            })
        {
            let src = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
            let html = format!("<img src=\"{}\">", html_escape::encode_double_quoted_attribute(&src));
            return Some(PastePayload::from_html(html));
        }

        if data.formats.is_empty() {
            return None;
        }
        let formats = data.formats.iter().cloned().collect();
        Some(PastePayload::from_formats(formats))
    }

    /// Start a fallback paste: save the caret and move the root's content
    /// into a holding fragment so the native paste lands in an empty root.
    /// Returns `false` when a fallback paste is already pending.
    pub fn begin_fallback(&mut self, doc: &mut Document) -> bool {
        if self.is_pending() {
            log::debug!("paste already pending, leaving it to the pending merge");
            return false;
        }
        doc.tracker().save();
        let held = doc.create_fragment();
        let root = doc.root();
        doc.move_children(root, held);
        self.held = Some(held);
        true
    }

    /// Finish a fallback paste: read what the native paste put into the
    /// root, put the held content back and restore the caret.
    pub fn finish_fallback(&mut self, doc: &mut Document) -> Option<PastePayload> {
        let held = self.held.take()?;
        if !doc.exists(held) {
            return None;
        }
        let root = doc.root();
        let pasted = doc.inner_markup(root);
        for child in doc.take_children(root) {
            doc.remove(child);
        }
        doc.move_children(held, root);
        doc.remove(held);
        doc.tracker().restore();
        Some(PastePayload::from_html(pasted))
    }

    /// Abandon a pending fallback paste, putting the held content back.
    pub fn cancel(&mut self, doc: &mut Document) {
        if self.held.is_some() {
            self.finish_fallback(doc);
        }
    }

    /// Run the payload through the paste pipeline and return the markup to
    /// insert.
    pub fn normalize(
        doc: &mut Document,
        hooks: &mut HookRegistry,
        payload: &PastePayload,
    ) -> Result<String, EngineError> {
        hooks.call(hooks::PASTE_RAW, HookPayload::Paste(payload))?;

        let mut value = match payload.html.as_deref().filter(|html| !html.is_empty()) {
            Some(html) => {
                let staging = doc.create_element("div");
                doc.set_inner_markup(staging, html);
                sanitize(doc, staging);
                fix_nesting(doc, staging);
                let cleaned = doc.inner_markup(staging);
                doc.remove(staging);
                cleaned
            }
            None => html_escape::encode_text(payload.text.as_deref().unwrap_or_default()).into_owned(),
        };

        if hooks.has_handler(hooks::FRAGMENT_TO_SOURCE)
            && let Some(source) = hooks.call_only_first(hooks::FRAGMENT_TO_SOURCE, HookPayload::Markup(&value))?
        {
            value = source;
        }
        hooks.call(hooks::PASTE, HookPayload::Markup(&value))?;
        if hooks.has_handler(hooks::FRAGMENT_TO_HTML)
            && let Some(markup) = hooks.call_only_first(hooks::FRAGMENT_TO_HTML, HookPayload::Markup(&value))?
        {
            value = markup;
        }
        hooks.call(hooks::PASTE_HTML, HookPayload::Markup(&value))?;
        Ok(value)
    }
}
