/// Failures surfaced by an editing session.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("hook handler for '{name}' failed: {source}")]
    Hook {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("editing session has been destroyed")]
    Destroyed,
}

impl EngineError {
    pub(crate) fn hook(name: &str, source: anyhow::Error) -> Self {
        Self::Hook {
            name: name.to_string(),
            source: source.into(),
        }
    }
}
