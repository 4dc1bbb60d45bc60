//! Knowledge base loading and lookup

use super::storage::{KnowledgeBase, KnowledgeEntry};
use std::path::Path;
use tracing::{info, warn};

/// Header placed in front of the entries rendered by [`KnowledgeService::format_context`]
pub const CONTEXT_HEADER: &str = "Relevant information from knowledge base:\n\n";

/// Read-only access to the knowledge base
#[derive(Debug, Clone, Default)]
pub struct KnowledgeService {
    knowledge_base: KnowledgeBase,
}

impl KnowledgeService {
    /// Wrap an already loaded knowledge base
    pub fn new(knowledge_base: KnowledgeBase) -> Self {
        Self { knowledge_base }
    }

    /// Load the knowledge base from a JSON file.
    ///
    /// A missing file yields an empty knowledge base; a file that exists but
    /// does not parse is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Knowledge base {} not found, starting with no entries",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let knowledge_base: KnowledgeBase = serde_json::from_str(&content).map_err(|e| {
            crate::Error::Knowledge(format!("failed to parse {}: {}", path.display(), e))
        })?;

        info!(
            "Loaded {} knowledge base entries from {}",
            knowledge_base.entries.len(),
            path.display()
        );
        Ok(Self::new(knowledge_base))
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    /// All entries in file order
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.knowledge_base.entries
    }

    /// Entries whose key or value contains `query`, ignoring case.
    ///
    /// With `tags`, only entries sharing at least one tag are kept. An empty
    /// tag list is the same as no filter.
    pub fn search(&self, query: &str, tags: Option<&[String]>) -> Vec<&KnowledgeEntry> {
        let needle = query.to_lowercase();
        self.knowledge_base
            .entries
            .iter()
            .filter(|entry| entry.matches(&needle))
            .filter(|entry| match tags {
                Some(tags) if !tags.is_empty() => entry.has_any_tag(tags),
                _ => true,
            })
            .collect()
    }

    /// The first `max_entries` matches for `query`
    pub fn relevant_entries(&self, query: &str, max_entries: usize) -> Vec<&KnowledgeEntry> {
        let mut entries = self.search(query, None);
        entries.truncate(max_entries);
        entries
    }

    /// Context block for the prompt, or an empty string when nothing matches
    pub fn relevant_context(&self, query: &str, max_entries: usize) -> String {
        Self::format_context(&self.relevant_entries(query, max_entries))
    }

    /// Render entries as the knowledge context block
    pub fn format_context(entries: &[&KnowledgeEntry]) -> String {
        if entries.is_empty() {
            return String::new();
        }

        let mut context = String::from(CONTEXT_HEADER);
        for entry in entries {
            context.push_str(&format!("**{}:**\n{}\n\n", entry.key, entry.value));
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(id: &str, key: &str, value: &str, tags: &[&str]) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn service() -> KnowledgeService {
        KnowledgeService::new(KnowledgeBase {
            entries: vec![
                entry("1", "Shipping", "We ship worldwide in 5 days", &["orders"]),
                entry("2", "Returns", "Returns accepted within 30 days", &["orders", "policy"]),
                entry("3", "Privacy", "We never sell your data", &["policy"]),
                entry("4", "Warranty", "Two years on all products", &["policy"]),
            ],
            ..KnowledgeBase::default()
        })
    }

    #[test]
    fn test_search_is_case_insensitive_on_key_and_value() {
        let kb = service();

        let keys: Vec<&str> = kb.search("SHIPPING", None).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Shipping"]);

        let keys: Vec<&str> = kb.search("days", None).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Shipping", "Returns"]);

        assert!(kb.search("refund", None).is_empty());
    }

    #[test]
    fn test_search_with_tags() {
        let kb = service();
        let tags = vec!["policy".to_string()];

        let keys: Vec<&str> = kb
            .search("days", Some(&tags))
            .iter()
            .map(|e| e.key.as_str())
            .collect();
        assert_eq!(keys, vec!["Returns"]);

        let none: Vec<String> = Vec::new();
        assert_eq!(kb.search("days", Some(&none)).len(), 2);
    }

    #[test]
    fn test_relevant_context_limits_and_formats() {
        let kb = service();

        // Empty query matches everything
        let context = kb.relevant_context("", 3);
        assert!(context.starts_with(CONTEXT_HEADER));
        assert!(context.contains("**Shipping:**\nWe ship worldwide in 5 days\n\n"));
        assert!(context.contains("**Privacy:**"));
        assert!(!context.contains("Warranty"));
    }

    #[test]
    fn test_relevant_context_empty_when_no_match() {
        assert_eq!(service().relevant_context("zebra", 3), "");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let kb = KnowledgeService::load(temp_dir.path().join("missing.json")).unwrap();

        assert!(kb.entries().is_empty());
        assert_eq!(kb.knowledge_base().title, "Chatbot");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"{"title":"Acme Help","description":"Support bot","entries":[
                {"id":"1","key":"Hours","value":"9 to 5","tags":[],"createdAt":"","updatedAt":""}
            ],"lastUpdated":"2025-06-01"}"#,
        )
        .unwrap();

        let kb = KnowledgeService::load(&path).unwrap();
        assert_eq!(kb.knowledge_base().title, "Acme Help");
        assert_eq!(kb.search("hours", None).len(), 1);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kb.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = KnowledgeService::load(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Knowledge(_)));
    }
}
