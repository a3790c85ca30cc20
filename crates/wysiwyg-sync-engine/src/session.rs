/*!
 * # Editing session
 *
 * One editing surface: the document, its keyword table, the hook registry,
 * the deferred-task scheduler and the per-session state of the change
 * detector, paste normalizer and selection checks.
 *
 * The host feeds input through the event methods (`key_down`, `key_press`,
 * `key_up`, `blur`, `paste`, ...), moves time forward with [`advance`] and
 * drains notifications with [`take_events`]. Everything runs synchronously
 * on the caller's thread; deferred work only happens inside `advance`.
 *
 * [`advance`]: EditingSession::advance
 * [`take_events`]: EditingSession::take_events
 */

use std::time::Duration;

use wysiwyg_sync_config::EditorConfig;

use crate::change::{ChangeDetector, Key};
use crate::dom::nesting::{can_have_children, first_block_parent, is_inline};
use crate::dom::{Document, NodeId};
use crate::error::EngineError;
use crate::events::EditorEvent;
use crate::hooks::{self, HookPayload, HookRegistry};
use crate::keywords::{
    DefaultVerbatim, KeywordTable, VerbatimPredicate, check_whitespace, in_verbatim,
    replace_keywords, restore_codes,
};
use crate::paste::{PasteEvent, PasteNormalizer, PasteOutcome, PastePayload};
use crate::scheduler::{Scheduler, Task, TimerId};
use crate::selection::{Position, PositionTracker, START_MARKER_ID, find_marker};

/// A formatting command as the toolbar describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: String,
    /// Shown to the user when the command fails.
    pub error_message: Option<String>,
}

impl CommandDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error_message: None,
        }
    }

    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }
}

pub struct EditingSession {
    doc: Document,
    config: EditorConfig,
    keywords: KeywordTable,
    verbatim: Box<dyn VerbatimPredicate>,
    hooks: HookRegistry,
    scheduler: Scheduler,
    change: ChangeDetector,
    paste: PasteNormalizer,
    value_timer: Option<TimerId>,
    paste_timer: Option<TimerId>,
    selection_timer: Option<TimerId>,
    source_mode: bool,
    source: String,
    last_selection: Option<Position>,
    current_node: Option<NodeId>,
    current_block: Option<NodeId>,
    scroll_target: Option<NodeId>,
    events: Vec<EditorEvent>,
    destroyed: bool,
}

impl EditingSession {
    pub fn new(config: EditorConfig) -> Self {
        let keywords = KeywordTable::from_sources(&config.keywords);
        log::debug!("editing session with {} keyword(s)", keywords.len());
        Self {
            doc: Document::new(),
            config,
            keywords,
            verbatim: Box::new(DefaultVerbatim),
            hooks: HookRegistry::new(),
            scheduler: Scheduler::new(),
            change: ChangeDetector::with_value(String::new()),
            paste: PasteNormalizer::new(),
            value_timer: None,
            paste_timer: None,
            selection_timer: None,
            source_mode: false,
            source: String::new(),
            last_selection: None,
            current_node: None,
            current_block: None,
            scroll_target: None,
            events: Vec::new(),
            destroyed: false,
        }
    }

    /// Start with `markup` as the content. The initial content does not
    /// count as a change.
    pub fn with_value(config: EditorConfig, markup: &str) -> Self {
        let mut session = Self::new(config);
        session.load_markup(markup);
        session.change.reset_value(session.value());
        session
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn tracker(&mut self) -> PositionTracker<'_> {
        self.doc.tracker()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn keyword_table(&self) -> &KeywordTable {
        &self.keywords
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    pub fn set_verbatim_predicate(&mut self, predicate: impl VerbatimPredicate + 'static) {
        self.verbatim = Box::new(predicate);
    }

    pub fn is_source_mode(&self) -> bool {
        self.source_mode
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Current content in the active representation.
    pub fn value(&self) -> String {
        if self.source_mode {
            self.source.clone()
        } else {
            self.doc.markup()
        }
    }

    /// Block holding the end of the last insertion.
    pub fn scroll_target(&self) -> Option<NodeId> {
        self.scroll_target
    }

    /// Block containing the caret as of the last node check.
    pub fn current_block(&self) -> Option<NodeId> {
        self.current_block
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the whole content, substitute keywords and flush the change
    /// detector.
    pub fn set_value(&mut self, value: &str) {
        if self.destroyed {
            return;
        }
        if self.source_mode {
            self.source = value.to_string();
        } else {
            self.load_markup(value);
        }
        self.trigger_value_changed();
    }

    fn load_markup(&mut self, markup: &str) {
        let root = self.doc.root();
        self.doc.set_inner_markup(root, markup);
        self.doc.set_selection(None);
        self.substitute_keywords(root);
    }

    fn substitute_keywords(&mut self, root: NodeId) -> usize {
        if !self.config.keywords_enabled {
            return 0;
        }
        replace_keywords(
            &mut self.doc,
            root,
            &self.keywords,
            self.config.compat_mode,
            self.verbatim.as_ref(),
        )
    }

    /// Put the caret after the last piece of content.
    pub fn move_caret_to_end(&mut self) {
        let mut container = self.doc.root();
        while let Some(last) = self.doc.last_child(container) {
            if self.doc.is_text(last) {
                let len = self.doc.node_len(last);
                self.doc.set_caret(last, len);
                return;
            }
            if !can_have_children(&self.doc, last) {
                break;
            }
            container = last;
        }
        let len = self.doc.node_len(container);
        self.doc.set_caret(container, len);
    }

    /// Insert markup at the selection. Refused inside verbatim regions.
    pub fn insert_html(&mut self, content: &str, end_content: Option<&str>) -> bool {
        self.insert_html_at_selection(content, end_content, false)
    }

    fn insert_html_at_selection(&mut self, content: &str, end_content: Option<&str>, into_verbatim: bool) -> bool {
        if self.destroyed || self.source_mode {
            return false;
        }
        if !into_verbatim
            && let Some(node) = self.doc.tracker().parent_node()
            && in_verbatim(&self.doc, node, self.verbatim.as_ref())
        {
            log::debug!("insert refused inside a verbatim region");
            return false;
        }
        if !self.doc.tracker().insert_html(content, end_content) {
            return false;
        }

        self.doc.tracker().save();
        self.scroll_target = find_marker(&self.doc, START_MARKER_ID)
            .and_then(|marker| first_block_parent(&self.doc, marker));
        let root = self.doc.root();
        self.substitute_keywords(root);
        self.doc.tracker().restore();

        self.check_node_changed();
        self.trigger_value_changed();
        true
    }

    /// Key pressed down. Returns whether the default action must be
    /// suppressed.
    pub fn key_down(&mut self, key: Key) -> bool {
        match key {
            Key::Backspace => self.handle_backspace(),
            _ => false,
        }
    }

    /// A character is about to be typed. Returns whether the default action
    /// must be suppressed because a keyword replacement consumed it.
    pub fn key_press(&mut self, typed: char) -> bool {
        if self.destroyed || self.source_mode || !self.config.keywords_enabled || self.keywords.is_empty() {
            return false;
        }
        let Some(node) = self.doc.tracker().parent_node() else {
            return false;
        };
        if in_verbatim(&self.doc, node, self.verbatim.as_ref()) {
            return false;
        }

        let compat = self.config.compat_mode;
        let max_len = self.keywords.max_code_length();
        let Some(found) = self
            .doc
            .tracker()
            .replace_keyword_at_caret(&self.keywords, false, compat, max_len, Some(typed))
        else {
            return false;
        };
        self.check_node_changed();
        found.consumed_typed
    }

    pub fn key_up(&mut self, key: Key) {
        if self.destroyed {
            return;
        }
        if self.change.key_up(key) {
            self.trigger_value_changed();
        }
        if !self.change.is_composing() {
            self.arm_value_timer();
        }
        if self.config.compat_mode && self.config.keywords_enabled && !self.source_mode {
            let root = self.doc.root();
            check_whitespace(&mut self.doc, root);
        }
        self.check_selection_changed();
    }

    pub fn composition_start(&mut self) {
        self.change.composition_start();
    }

    pub fn composition_end(&mut self) {
        self.change.composition_end();
    }

    /// Focus left the editing surface.
    pub fn blur(&mut self) {
        if self.destroyed {
            return;
        }
        if self.value_timer.is_some() {
            self.trigger_value_changed();
        }
    }

    /// Type `text` the way a user would: key events around every character,
    /// with the character inserted unless a replacement consumed it.
    pub fn type_text(&mut self, text: &str) {
        for typed in text.chars() {
            let key = if typed == '\n' { Key::Enter } else { Key::Char(typed) };
            self.key_down(key);
            if !self.key_press(typed) {
                if typed == '\n' {
                    self.doc.tracker().insert_html("<br>", None);
                } else {
                    let mut buf = [0; 4];
                    self.doc.tracker().insert_text(typed.encode_utf8(&mut buf));
                }
            }
            self.key_up(key);
        }
    }

    /// Backspace as the user presses it.
    pub fn press_backspace(&mut self) {
        if !self.key_down(Key::Backspace) {
            self.doc.tracker().delete_backward();
        }
        self.key_up(Key::Backspace);
    }

    fn handle_backspace(&mut self) -> bool {
        if self.destroyed || self.source_mode || self.config.disable_block_remove {
            return false;
        }
        let Some(range) = self.doc.tracker().selected_range() else {
            return false;
        };
        if range.start.offset != 0 {
            return false;
        }
        let Some(block) = self.current_styled_block() else {
            return false;
        };

        // only empty text may come before the caret inside the block
        let mut node = range.start.node;
        while node != block {
            let mut sibling = node;
            while let Some(previous) = self.doc.previous_sibling(sibling) {
                if self.doc.text(previous) != Some("") {
                    return false;
                }
                sibling = previous;
            }
            let Some(parent) = self.doc.parent(node) else {
                return false;
            };
            node = parent;
        }

        if !self.clear_block_formatting(block) {
            return false;
        }
        self.check_node_changed();
        true
    }

    fn current_styled_block(&mut self) -> Option<NodeId> {
        let root = self.doc.root();
        let mut block = self.doc.tracker().first_block_parent(None)?;
        loop {
            if block == root {
                return None;
            }
            if has_styling(&self.doc, block) && !is_inline(&self.doc, block, true) {
                return Some(block);
            }
            block = self.doc.parent(block)?;
        }
    }

    /// Drop a block's class and style and turn it into a paragraph unless it
    /// already is a `p`, `div` or `td`. Verbatim blocks are left alone.
    pub fn clear_block_formatting(&mut self, block: NodeId) -> bool {
        if in_verbatim(&self.doc, block, self.verbatim.as_ref()) {
            return false;
        }
        self.doc.remove_attr(block, "style");
        self.doc.remove_attr(block, "class");
        if !self.doc.is_tag(block, &["p", "div", "td"]) {
            self.doc.set_tag(block, "p");
        }
        true
    }

    /// Handle a paste event. Structured data is normalized and inserted
    /// at once; otherwise the native paste is let through and merged on the
    /// next tick.
    pub fn paste(&mut self, event: PasteEvent) -> Result<PasteOutcome, EngineError> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        if self.source_mode {
            return Ok(PasteOutcome::NativeAllowed);
        }
        if self.paste.is_pending() {
            log::debug!("paste while a merge is pending");
            return Ok(PasteOutcome::AlreadyPending);
        }

        let payload = match &event {
            PasteEvent::Clipboard(data) => PasteNormalizer::payload_from_clipboard(data),
            PasteEvent::Native => None,
        };
        match payload {
            Some(payload) => Ok(if self.insert_paste(&payload)? {
                PasteOutcome::Inserted
            } else {
                PasteOutcome::Dropped
            }),
            None => {
                self.paste.begin_fallback(&mut self.doc);
                self.paste_timer = Some(self.scheduler.defer(Task::PasteMerge));
                Ok(PasteOutcome::NativeAllowed)
            }
        }
    }

    /// Normalize and insert pasted content. Without a live selection the
    /// caret goes to the end of the content first.
    fn insert_paste(&mut self, payload: &PastePayload) -> Result<bool, EngineError> {
        let value = PasteNormalizer::normalize(&mut self.doc, &mut self.hooks, payload)?;
        if !self.doc.tracker().has_selection() {
            self.move_caret_to_end();
        }
        Ok(self.insert_html_at_selection(&value, None, true))
    }

    /// Switch between rich content and its source representation, running
    /// the `toSource` / `toWysiwyg` filters when registered.
    pub fn toggle_source_mode(&mut self) -> Result<(), EngineError> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        if self.source_mode {
            let markup = self.filter(hooks::TO_WYSIWYG, self.source.clone())?;
            self.source_mode = false;
            self.load_markup(&markup);
            self.source.clear();
        } else {
            self.doc.tracker().remove_markers();
            let mut plain = self.doc.clone();
            let root = plain.root();
            restore_codes(&mut plain, root);
            self.source = self.filter(hooks::TO_SOURCE, plain.markup())?;
            self.source_mode = true;
        }
        log::debug!("source mode: {}", self.source_mode);
        self.change.reset_value(self.value());
        Ok(())
    }

    fn filter(&mut self, name: &str, value: String) -> Result<String, EngineError> {
        if !self.hooks.has_handler(name) {
            return Ok(value);
        }
        Ok(self
            .hooks
            .call_only_first(name, HookPayload::Markup(&value))?
            .unwrap_or(value))
    }

    /// Turn keyword substitution on (substituting the whole content) or off
    /// (turning every replacement back into its code).
    pub fn set_keywords_enabled(&mut self, enabled: bool) {
        if self.destroyed || enabled == self.config.keywords_enabled {
            return;
        }
        self.config.keywords_enabled = enabled;
        if self.source_mode {
            return;
        }
        let root = self.doc.root();
        self.doc.tracker().save();
        if enabled {
            self.substitute_keywords(root);
        } else {
            restore_codes(&mut self.doc, root);
        }
        self.doc.tracker().restore();
        self.trigger_value_changed();
    }

    /// Run a formatting command. A failure is reported as
    /// [`EditorEvent::CommandFailed`] when the descriptor has a message.
    pub fn exec_command<F>(&mut self, command: &CommandDescriptor, run: F) -> bool
    where
        F: FnOnce(&mut Document) -> anyhow::Result<()>,
    {
        if self.destroyed {
            return false;
        }
        match run(&mut self.doc) {
            Ok(()) => {
                self.check_node_changed();
                self.arm_value_timer();
                true
            }
            Err(err) => {
                log::debug!("command {} failed: {err:#}", command.name);
                if let Some(message) = &command.error_message {
                    self.events.push(EditorEvent::CommandFailed {
                        message: message.clone(),
                    });
                }
                false
            }
        }
    }

    /// Check whether the selection moved. Immediate when the host reports
    /// selection changes natively, otherwise coalesced into one check per
    /// interval.
    pub fn check_selection_changed(&mut self) {
        if self.destroyed {
            return;
        }
        if self.config.native_selection_change {
            self.run_selection_check();
            return;
        }
        if self.selection_timer.is_some() {
            return;
        }
        let interval = Duration::from_millis(self.config.selection_check_interval_ms);
        self.selection_timer = Some(self.scheduler.schedule(interval, Task::SelectionCheck));
    }

    fn run_selection_check(&mut self) {
        let tracker = self.doc.tracker();
        if tracker.compare(self.last_selection.as_ref()) {
            return;
        }
        self.last_selection = tracker.clone_selected();
        self.events.push(EditorEvent::SelectionChanged);
        self.check_node_changed();
    }

    /// Emit `NodeChanged` when the element containing the selection differs
    /// from the last check.
    pub fn check_node_changed(&mut self) {
        let node = self.doc.tracker().parent_node();
        if node == self.current_node {
            return;
        }
        let old_node = self.current_node;
        self.current_node = node;
        self.current_block = node.and_then(|node| first_block_parent(&self.doc, node));
        self.events.push(EditorEvent::NodeChanged {
            old_node,
            new_node: node,
        });
    }

    /// Move the clock forward by `millis`, running every task that falls due.
    pub fn advance(&mut self, millis: u64) -> Result<(), EngineError> {
        let until = self.scheduler.now() + Duration::from_millis(millis);
        while let Some((id, task)) = self.scheduler.pop_due(until) {
            log::trace!("running {task:?} at {:?}", self.scheduler.now());
            self.run_task(id, task)?;
        }
        self.scheduler.set_now(until);
        Ok(())
    }

    /// Run the tasks due on the next tick.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        self.advance(0)
    }

    fn run_task(&mut self, id: TimerId, task: Task) -> Result<(), EngineError> {
        if self.destroyed {
            return Ok(());
        }
        match task {
            Task::ValueChangedFlush if self.value_timer == Some(id) => {
                self.value_timer = None;
                self.trigger_value_changed();
            }
            Task::PasteMerge if self.paste_timer == Some(id) => {
                self.paste_timer = None;
                if let Some(payload) = self.paste.finish_fallback(&mut self.doc)
                    && !self.insert_paste(&payload)?
                {
                    log::warn!("pasted content could not be inserted");
                }
            }
            Task::SelectionCheck if self.selection_timer == Some(id) => {
                self.selection_timer = None;
                self.run_selection_check();
            }
            _ => log::trace!("stale {task:?} ignored"),
        }
        Ok(())
    }

    fn arm_value_timer(&mut self) {
        if let Some(timer) = self.value_timer.take() {
            self.scheduler.cancel(timer);
        }
        let delay = Duration::from_millis(self.config.value_changed_delay_ms);
        self.value_timer = Some(self.scheduler.schedule(delay, Task::ValueChangedFlush));
    }

    /// Flush the change detector: notify when the content differs from the
    /// last notified value.
    fn trigger_value_changed(&mut self) {
        if let Some(timer) = self.value_timer.take() {
            self.scheduler.cancel(timer);
        }
        let with_markers = !self.source_mode
            && self.doc.tracker().has_selection()
            && find_marker(&self.doc, START_MARKER_ID).is_none();
        if with_markers {
            self.doc.tracker().save();
        }

        if let Some(raw_value) = self.change.flush(self.value()) {
            log::debug!("value changed ({} bytes)", raw_value.len());
            self.events.push(EditorEvent::ValueChanged { raw_value });
        }

        if with_markers {
            self.doc.tracker().remove_markers();
        }
    }

    /// Cancel all pending work and drop the session state. Any later event
    /// or timer is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.scheduler.cancel_all();
        self.value_timer = None;
        self.paste_timer = None;
        self.selection_timer = None;
        self.paste.cancel(&mut self.doc);
        self.hooks.clear();
        self.keywords = KeywordTable::default();
        self.change = ChangeDetector::new();
        self.destroyed = true;
        log::debug!("editing session destroyed");
    }
}

/// Whether a block carries formatting that Backspace at its start clears.
fn has_styling(doc: &Document, node: NodeId) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    !doc.is_tag(node, &["p", "div"])
        || element
            .attrs
            .iter()
            .any(|(name, _)| name == "class" || name == "style" || name.starts_with("data-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paste::{ClipboardData, TEXT_HTML, TEXT_PLAIN};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wysiwyg_sync_config::KeywordEntry;

    fn config() -> EditorConfig {
        let mut config = EditorConfig::default();
        config
            .keywords
            .more
            .insert(":)".to_string(), KeywordEntry::Url("smile.png".to_string()));
        config
            .keywords
            .more
            .insert("lol".to_string(), KeywordEntry::Url("lol.png".to_string()));
        config
    }

    fn img(code: &str, url: &str) -> String {
        format!("<img src=\"{url}\" data-keyword=\"{code}\" alt=\"{code}\" title=\"{code}\">")
    }

    fn session_at_end(markup: &str) -> EditingSession {
        let mut session = EditingSession::with_value(config(), markup);
        session.move_caret_to_end();
        session
    }

    /// First text node of the first block.
    fn first_text(session: &EditingSession) -> NodeId {
        let doc = session.document();
        let block = doc.first_child(doc.root()).unwrap();
        doc.first_child(block).unwrap()
    }

    fn values(session: &mut EditingSession) -> Vec<String> {
        session
            .take_events()
            .into_iter()
            .filter_map(|event| match event {
                EditorEvent::ValueChanged { raw_value } => Some(raw_value),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn initial_value_is_substituted_silently() {
        let mut session = EditingSession::with_value(config(), "<p>hi :)</p>");
        assert_eq!(session.value(), format!("<p>hi {}</p>", img(":)", "smile.png")));
        assert_eq!(session.take_events(), vec![]);
    }

    #[test]
    fn typing_a_code_replaces_it() {
        let mut session = session_at_end("<p>hi </p>");
        session.type_text(":)");
        assert_eq!(session.value(), format!("<p>hi {}</p>", img(":)", "smile.png")));
    }

    #[test]
    fn compat_mode_waits_for_the_space() {
        let mut config = config();
        config.compat_mode = true;
        let mut session = EditingSession::with_value(config, "<p>a </p>");
        session.move_caret_to_end();

        session.type_text("lol");
        assert_eq!(session.value(), "<p>a lol</p>");
        session.type_text(" ");
        assert_eq!(session.value(), format!("<p>a {} </p>", img("lol", "lol.png")));
    }

    #[test]
    fn word_and_class_boundaries_flush_at_once() {
        let mut session = session_at_end("<p>x</p>");
        session.type_text("a b");
        assert_eq!(values(&mut session), vec!["<p>xa</p>", "<p>xa </p>", "<p>xa b</p>"]);
    }

    #[test]
    fn same_class_typing_waits_for_the_debounce() {
        let mut session = session_at_end("<p>x</p>");
        session.type_text("ab");
        assert_eq!(values(&mut session), vec!["<p>xa</p>"]);

        session.advance(1499).unwrap();
        assert_eq!(values(&mut session), Vec::<String>::new());
        session.advance(1).unwrap();
        assert_eq!(values(&mut session), vec!["<p>xab</p>"]);
    }

    #[test]
    fn blur_flushes_the_pending_change() {
        let mut session = session_at_end("<p>x</p>");
        session.type_text("ab");
        session.take_events();

        session.blur();
        assert_eq!(values(&mut session), vec!["<p>xab</p>"]);
        session.advance(5000).unwrap();
        assert_eq!(values(&mut session), Vec::<String>::new());
    }

    #[test]
    fn composition_holds_notifications() {
        let mut session = session_at_end("<p>x</p>");
        session.composition_start();
        session.type_text("あ");
        session.advance(5000).unwrap();
        assert_eq!(values(&mut session), Vec::<String>::new());

        session.composition_end();
        session.key_up(Key::Other);
        assert_eq!(values(&mut session), vec!["<p>xあ</p>"]);
    }

    #[test]
    fn structured_paste_is_cleaned_and_inserted() {
        let mut session = EditingSession::with_value(config(), "<p>ab</p>");
        let text = first_text(&session);
        session.document_mut().set_caret(text, 1);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        session.hooks_mut().register(hooks::PASTE_HTML, move |payload| {
            if let HookPayload::Markup(markup) = payload {
                log.borrow_mut().push(markup.to_string());
            }
            Ok(None)
        });

        let data = ClipboardData::new()
            .with_format(TEXT_PLAIN, "x")
            .with_format(TEXT_HTML, "<b onclick=\"evil()\">x</b><script>evil()</script>");
        let outcome = session.paste(PasteEvent::Clipboard(data)).unwrap();

        assert_eq!(outcome, PasteOutcome::Inserted);
        assert_eq!(session.value(), "<p>a<b>x</b>b</p>");
        assert_eq!(*seen.borrow(), vec!["<b>x</b>".to_string()]);
    }

    #[test]
    fn paste_without_selection_lands_at_the_end() {
        let mut session = EditingSession::with_value(config(), "<p>ab</p>");
        assert!(session.document().selection().is_none());

        let data = ClipboardData::new().with_format(TEXT_PLAIN, "PASTED");
        let outcome = session.paste(PasteEvent::Clipboard(data)).unwrap();

        assert_eq!(outcome, PasteOutcome::Inserted);
        assert_eq!(session.value(), "<p>abPASTED</p>");
    }

    #[test]
    fn fallback_paste_merges_on_next_tick() {
        let mut session = session_at_end("<p>ab</p>");

        assert_eq!(session.paste(PasteEvent::Native).unwrap(), PasteOutcome::NativeAllowed);
        assert_eq!(session.value(), "");
        let root = session.document().root();
        session.document_mut().set_inner_markup(root, "<i>pasted</i>");
        assert_eq!(session.paste(PasteEvent::Native).unwrap(), PasteOutcome::AlreadyPending);

        session.tick().unwrap();
        assert_eq!(session.value(), "<p>ab<i>pasted</i></p>");
        assert_eq!(session.paste(PasteEvent::Native).unwrap(), PasteOutcome::NativeAllowed);
    }

    #[test]
    fn failing_hook_aborts_the_paste() {
        let mut session = session_at_end("<p>ab</p>");
        session
            .hooks_mut()
            .register(hooks::PASTE_RAW, |_| Err(anyhow::anyhow!("rejected")));

        let data = ClipboardData::new().with_format(TEXT_PLAIN, "x");
        let err = session.paste(PasteEvent::Clipboard(data)).unwrap_err();

        assert!(matches!(err, EngineError::Hook { ref name, .. } if name == hooks::PASTE_RAW));
        assert_eq!(session.value(), "<p>ab</p>");
    }

    #[test]
    fn source_mode_round_trip() {
        let mut session = EditingSession::with_value(config(), "<p>hi :)</p>");
        session.hooks_mut().register(hooks::TO_SOURCE, |payload| match payload {
            HookPayload::Markup(markup) => Ok(Some(format!("src:{markup}"))),
            _ => Ok(None),
        });
        session.hooks_mut().register(hooks::TO_WYSIWYG, |payload| match payload {
            HookPayload::Markup(markup) => Ok(markup.strip_prefix("src:").map(str::to_string)),
            _ => Ok(None),
        });

        session.toggle_source_mode().unwrap();
        assert!(session.is_source_mode());
        assert_eq!(session.value(), "src:<p>hi :)</p>");

        session.toggle_source_mode().unwrap();
        assert_eq!(session.value(), format!("<p>hi {}</p>", img(":)", "smile.png")));
        assert_eq!(session.take_events(), vec![]);
    }

    #[test]
    fn disabling_keywords_restores_codes() {
        let mut session = EditingSession::with_value(config(), "<p>hi :)</p>");
        session.set_keywords_enabled(false);
        assert_eq!(values(&mut session), vec!["<p>hi :)</p>"]);

        session.set_keywords_enabled(true);
        assert_eq!(
            values(&mut session),
            vec![format!("<p>hi {}</p>", img(":)", "smile.png"))]
        );
    }

    #[test]
    fn insert_html_substitutes_and_records_scroll_target() {
        let mut session = session_at_end("<p>a</p>");
        let p = session.document().first_child(session.document().root()).unwrap();

        assert!(session.insert_html("see :)", None));
        assert_eq!(session.value(), format!("<p>asee {}</p>", img(":)", "smile.png")));
        assert_eq!(session.scroll_target(), Some(p));
    }

    #[test]
    fn insert_html_refused_in_verbatim_region() {
        let mut session = session_at_end("<pre>code</pre>");
        assert!(!session.insert_html("<b>x</b>", None));
        assert_eq!(session.value(), "<pre>code</pre>");
    }

    #[test]
    fn backspace_clears_block_formatting() {
        let mut session = EditingSession::with_value(config(), "<h1 class=\"big\">Title</h1>");
        let h1 = session.document().first_child(session.document().root()).unwrap();
        let text = session.document().first_child(h1).unwrap();
        session.document_mut().set_caret(text, 0);

        session.press_backspace();
        assert_eq!(session.value(), "<p>Title</p>");
    }

    #[test]
    fn backspace_block_clearing_can_be_disabled() {
        let mut config = config();
        config.disable_block_remove = true;
        let mut session = EditingSession::with_value(config, "<h1 class=\"big\">Title</h1>");
        let h1 = session.document().first_child(session.document().root()).unwrap();
        let text = session.document().first_child(h1).unwrap();
        session.document_mut().set_caret(text, 0);

        session.press_backspace();
        assert_eq!(session.value(), "<h1 class=\"big\">Title</h1>");
    }

    #[test]
    fn failed_command_reports_its_message() {
        let mut session = session_at_end("<p>x</p>");
        let command = CommandDescriptor::new("bold").with_error_message("Could not apply bold");

        assert!(!session.exec_command(&command, |_| anyhow::bail!("no selection")));
        assert_eq!(
            session.take_events(),
            vec![EditorEvent::CommandFailed {
                message: "Could not apply bold".to_string()
            }]
        );
        assert!(!session.exec_command(&CommandDescriptor::new("quiet"), |_| anyhow::bail!("nope")));
        assert_eq!(session.take_events(), vec![]);
    }

    #[test]
    fn successful_command_schedules_a_change() {
        let mut session = session_at_end("<p>x</p>");
        let ok = session.exec_command(&CommandDescriptor::new("wrap"), |doc| {
            let root = doc.root();
            let p = doc.first_child(root).ok_or_else(|| anyhow::anyhow!("empty"))?;
            doc.set_tag(p, "h2");
            Ok(())
        });
        assert!(ok);
        session.take_events();

        session.advance(1500).unwrap();
        assert_eq!(values(&mut session), vec!["<h2>x</h2>"]);
    }

    #[test]
    fn flushing_leaves_the_caret_where_it_was() {
        let mut session = EditingSession::with_value(config(), "<p>ab<b>c</b></p>");
        let text = first_text(&session);
        session.document_mut().set_caret(text, 2);
        session.check_selection_changed();
        session.take_events();

        assert!(session.exec_command(&CommandDescriptor::new("noop"), |_| Ok(())));
        session.advance(1500).unwrap();
        session.check_selection_changed();

        assert_eq!(session.document().selection(), Some(&Position::caret(text, 2)));
        assert!(!session.take_events().contains(&EditorEvent::SelectionChanged));
    }

    #[test]
    fn arena_stays_bounded_over_long_editing() {
        let mut session = session_at_end("<p>hello</p>");
        let edit = |session: &mut EditingSession| {
            session.type_text("a ");
            session.press_backspace();
            session.press_backspace();
        };

        edit(&mut session);
        let slots = session.document().slot_count();
        for _ in 0..500 {
            edit(&mut session);
        }
        session.advance(1500).unwrap();

        assert_eq!(session.value(), "<p>hello</p>");
        assert!(session.document().slot_count() <= slots);
    }

    #[test]
    fn throttled_selection_checks_coalesce() {
        let mut config = config();
        config.native_selection_change = false;
        let mut session = EditingSession::with_value(config, "<p>abc</p>");
        let text = first_text(&session);

        session.document_mut().set_caret(text, 1);
        session.check_selection_changed();
        session.document_mut().set_caret(text, 2);
        session.check_selection_changed();
        assert_eq!(session.take_events(), vec![]);

        session.advance(100).unwrap();
        let events = session.take_events();
        let selection_events = events
            .iter()
            .filter(|event| **event == EditorEvent::SelectionChanged)
            .count();
        assert_eq!(selection_events, 1);
        assert!(events.iter().any(|event| matches!(event, EditorEvent::NodeChanged { .. })));
    }

    #[test]
    fn destroyed_session_ignores_everything() {
        let mut session = session_at_end("<p>x</p>");
        session.type_text("ab");
        session.take_events();
        session.destroy();

        session.advance(5000).unwrap();
        session.set_value("<p>other</p>");
        assert_eq!(session.take_events(), vec![]);
        assert!(matches!(session.paste(PasteEvent::Native), Err(EngineError::Destroyed)));
        assert!(session.is_destroyed());
    }
}
