//! The keyword table and the replacement element built for a match.

use std::collections::BTreeMap;

use wysiwyg_sync_config::KeywordSources;

use crate::dom::{Document, NodeId};

/// Attribute on a replacement element holding the code it stands for.
pub const KEYWORD_ATTR: &str = "data-keyword";

/// What a code is replaced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordDescriptor {
    /// Image URL of the replacement.
    pub content_url: String,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub code: String,
    pub descriptor: KeywordDescriptor,
}

/// Codes and their replacements, kept sorted by code length so matching
/// can always try the longest code first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    entries: Vec<Keyword>,
    max_code_length: usize,
}

impl KeywordTable {
    /// Build a table. A code given twice keeps its last descriptor and empty
    /// codes are ignored.
    pub fn new(entries: impl IntoIterator<Item = (String, KeywordDescriptor)>) -> Self {
        let unique: BTreeMap<String, KeywordDescriptor> = entries
            .into_iter()
            .filter(|(code, _)| !code.is_empty())
            .collect();
        let mut entries: Vec<Keyword> = unique
            .into_iter()
            .map(|(code, descriptor)| Keyword { code, descriptor })
            .collect();
        entries.sort_by(|a, b| a.code.len().cmp(&b.code.len()).then_with(|| a.code.cmp(&b.code)));
        let max_code_length = entries
            .iter()
            .map(|keyword| keyword.code.chars().count())
            .max()
            .unwrap_or(0);
        Self {
            entries,
            max_code_length,
        }
    }

    /// Merge the configured groups into one table.
    pub fn from_sources(sources: &KeywordSources) -> Self {
        Self::new(sources.merged().into_iter().map(|(code, entry)| {
            let descriptor = KeywordDescriptor {
                content_url: entry.url().to_string(),
                tooltip: entry.tooltip().map(str::to_string),
            };
            (code, descriptor)
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, code: &str) -> Option<&Keyword> {
        self.entries.iter().find(|keyword| keyword.code == code)
    }

    /// Entries, longest code first.
    pub fn longest_first(&self) -> impl Iterator<Item = &Keyword> {
        self.entries.iter().rev()
    }

    /// Length in chars of the longest code.
    pub fn max_code_length(&self) -> usize {
        self.max_code_length
    }
}

/// Markup of the element that replaces `keyword`.
pub fn replacement_markup(keyword: &Keyword) -> String {
    let mut doc = Document::new();
    let node = create_replacement(&mut doc, keyword);
    crate::dom::markup::serialize_node(&doc, node, false)
}

/// Create a detached replacement element for `keyword`.
pub fn create_replacement(doc: &mut Document, keyword: &Keyword) -> NodeId {
    let title = keyword
        .descriptor
        .tooltip
        .clone()
        .unwrap_or_else(|| keyword.code.clone());
    doc.create_element_with(
        "img",
        vec![
            ("src".to_string(), keyword.descriptor.content_url.clone()),
            (KEYWORD_ATTR.to_string(), keyword.code.clone()),
            ("alt".to_string(), keyword.code.clone()),
            ("title".to_string(), title),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wysiwyg_sync_config::KeywordEntry;

    fn descriptor(url: &str) -> KeywordDescriptor {
        KeywordDescriptor {
            content_url: url.to_string(),
            tooltip: None,
        }
    }

    #[test]
    fn longest_code_comes_first() {
        let table = KeywordTable::new([
            (":)".to_string(), descriptor("smile.png")),
            (":-)".to_string(), descriptor("smile2.png")),
            ("lol".to_string(), descriptor("lol.png")),
            ("".to_string(), descriptor("nothing.png")),
        ]);

        let codes: Vec<&str> = table.longest_first().map(|k| k.code.as_str()).collect();
        assert_eq!(codes, vec!["lol", ":-)", ":)"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.max_code_length(), 3);
    }

    #[test]
    fn max_length_counts_chars() {
        let table = KeywordTable::new([("☃☃".to_string(), descriptor("snow.png"))]);
        assert_eq!(table.max_code_length(), 2);
    }

    #[test]
    fn from_config_groups() {
        let mut sources = KeywordSources::default();
        sources
            .more
            .insert(":)".to_string(), KeywordEntry::Url("more.png".to_string()));
        sources.hidden.insert(
            ":)".to_string(),
            KeywordEntry::Detailed {
                url: "hidden.png".to_string(),
                tooltip: Some("Smile".to_string()),
            },
        );

        let table = KeywordTable::from_sources(&sources);
        let smile = table.get(":)").unwrap();
        assert_eq!(smile.descriptor.content_url, "hidden.png");
        assert_eq!(smile.descriptor.tooltip.as_deref(), Some("Smile"));
    }

    #[test]
    fn replacement_element_markup() {
        let keyword = Keyword {
            code: ":P".to_string(),
            descriptor: descriptor("tongue.png?size=1&theme=2"),
        };
        assert_eq!(
            replacement_markup(&keyword),
            "<img src=\"tongue.png?size=1&amp;theme=2\" data-keyword=\":P\" alt=\":P\" title=\":P\">"
        );
    }
}
