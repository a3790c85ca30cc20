//! Named extension points. Handlers run in registration order and may
//! return a replacement value, which only [`HookRegistry::call_only_first`]
//! looks at.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::EngineError;
use crate::paste::PastePayload;

pub const PASTE_RAW: &str = "pasteRaw";
pub const PASTE: &str = "paste";
pub const PASTE_HTML: &str = "pasteHtml";
pub const FRAGMENT_TO_SOURCE: &str = "fragmentToSource";
pub const FRAGMENT_TO_HTML: &str = "fragmentToHtml";
pub const TO_SOURCE: &str = "toSource";
pub const TO_WYSIWYG: &str = "toWysiwyg";

/// What a hook is called with.
#[derive(Debug, Clone, Copy)]
pub enum HookPayload<'a> {
    Paste(&'a PastePayload),
    Markup(&'a str),
}

pub type HookResult = anyhow::Result<Option<String>>;

type Handler = Box<dyn FnMut(&HookPayload<'_>) -> HookResult>;

#[derive(Default)]
pub struct HookRegistry {
    handlers: BTreeMap<String, Vec<Handler>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        f.debug_struct("HookRegistry").field("handlers", &counts).finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: FnMut(&HookPayload<'_>) -> HookResult + 'static,
    {
        self.handlers
            .entry(name.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.get(name).is_some_and(|handlers| !handlers.is_empty())
    }

    /// Run every handler for `name`, stopping at the first error.
    pub fn call(&mut self, name: &str, payload: HookPayload<'_>) -> Result<(), EngineError> {
        let Some(handlers) = self.handlers.get_mut(name) else {
            return Ok(());
        };
        log::trace!("calling {} handler(s) for hook {name}", handlers.len());
        for handler in handlers.iter_mut() {
            handler(&payload).map_err(|err| EngineError::hook(name, err))?;
        }
        Ok(())
    }

    /// Run only the first handler for `name` and return what it produced.
    pub fn call_only_first(
        &mut self,
        name: &str,
        payload: HookPayload<'_>,
    ) -> Result<Option<String>, EngineError> {
        let Some(handler) = self.handlers.get_mut(name).and_then(|handlers| handlers.first_mut()) else {
            return Ok(None);
        };
        handler(&payload).map_err(|err| EngineError::hook(name, err))
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}
