//! Static knowledge base used to ground answers.
//!
//! Entries are loaded once from a JSON file and searched by plain
//! case-insensitive substring matching.

pub mod service;
pub mod storage;

pub use service::{KnowledgeService, CONTEXT_HEADER};
pub use storage::{KnowledgeBase, KnowledgeEntry};
