//! Knowledge base file format

use serde::{Deserialize, Serialize};

/// One knowledge base entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: String,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl KnowledgeEntry {
    /// Case-insensitive substring match against key or value.
    /// `needle` must already be lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.key.to_lowercase().contains(needle) || self.value.to_lowercase().contains(needle)
    }

    /// True when the entry carries at least one of `tags`
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }
}

/// The whole knowledge base document. Unknown fields such as `$schema` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub entries: Vec<KnowledgeEntry>,
    #[serde(default)]
    pub last_updated: String,
}

fn default_title() -> String {
    "Chatbot".to_string()
}

fn default_description() -> String {
    "AI Assistant".to_string()
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: default_description(),
            entries: Vec::new(),
            last_updated: String::new(),
        }
    }
}
