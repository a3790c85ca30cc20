use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// A keyword replacement as written in the config: either a bare content URL
/// or a table with an optional tooltip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
    },
}

impl KeywordEntry {
    pub fn url(&self) -> &str {
        match self {
            KeywordEntry::Url(url) => url,
            KeywordEntry::Detailed { url, .. } => url,
        }
    }

    pub fn tooltip(&self) -> Option<&str> {
        match self {
            KeywordEntry::Url(_) => None,
            KeywordEntry::Detailed { tooltip, .. } => tooltip.as_deref(),
        }
    }
}

/// The three keyword groups. They are merged in declaration order, so a code
/// present in `hidden` overrides the same code in `more`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSources {
    #[serde(default)]
    pub more: BTreeMap<String, KeywordEntry>,
    #[serde(default)]
    pub dropdown: BTreeMap<String, KeywordEntry>,
    #[serde(default)]
    pub hidden: BTreeMap<String, KeywordEntry>,
}

impl KeywordSources {
    /// Merges the groups into one mapping, later groups winning.
    pub fn merged(&self) -> BTreeMap<String, KeywordEntry> {
        let mut merged = self.more.clone();
        merged.extend(self.dropdown.clone());
        merged.extend(self.hidden.clone());
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.more.is_empty() && self.dropdown.is_empty() && self.hidden.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Replace shorthand codes with their replacement content.
    pub keywords_enabled: bool,
    /// Require whitespace on both sides of a code before replacing it.
    pub compat_mode: bool,
    pub keywords: KeywordSources,
    /// Whether the host reports selection changes itself. When false the
    /// session throttles its own selection checks.
    pub native_selection_change: bool,
    pub value_changed_delay_ms: u64,
    pub selection_check_interval_ms: u64,
    /// Stop Backspace at the start of a styled block from clearing the style.
    pub disable_block_remove: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            keywords_enabled: true,
            compat_mode: false,
            keywords: KeywordSources::default(),
            native_selection_change: true,
            value_changed_delay_ms: 1500,
            selection_check_interval_ms: 100,
            disable_block_remove: false,
        }
    }
}

impl EditorConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: EditorConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/wysiwyg-sync");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expands `~` and environment variables in a user supplied path,
    /// falling back to the path as given.
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => path.to_path_buf(),
        }
    }
}
