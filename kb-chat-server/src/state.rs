use kb_chat_agent::ChatAgent;
use kb_chat_core::knowledge::KnowledgeService;
use kb_chat_core::session::{SessionStore, Turn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session used when a chat request does not name one
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ChatAgent>,
    pub knowledge: Arc<KnowledgeService>,
    pub max_context_entries: usize,
}

impl AppState {
    pub fn new(
        agent: Arc<ChatAgent>,
        knowledge: Arc<KnowledgeService>,
        max_context_entries: usize,
    ) -> Self {
        Self {
            agent,
            knowledge,
            max_context_entries,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        self.agent.sessions()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Option<Vec<String>>,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfigResponse {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub history: Vec<Turn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
