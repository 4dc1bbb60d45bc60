use axum::{
    extract::{Path, State},
    Json,
};
use kb_chat_core::knowledge::{KnowledgeEntry, KnowledgeService};
use kb_chat_core::utils::truncate;
use tracing::info;

use crate::state::{
    AppState, ChatRequest, ChatResponse, HistoryResponse, MessageResponse, SessionsResponse,
    SiteConfigResponse, DEFAULT_SESSION_ID,
};

pub async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Chatbot API is running".to_string(),
    })
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = payload
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
    info!("Received message: {}", truncate(&payload.message, 200));

    let entries = state
        .knowledge
        .relevant_entries(&payload.message, state.max_context_entries);
    let context = KnowledgeService::format_context(&entries);
    info!("Context found: {} characters", context.len());

    let response = state
        .agent
        .respond(&payload.message, Some(&context), &session_id)
        .await;
    info!("Generated response: {} characters", response.len());

    let sources = if entries.is_empty() {
        None
    } else {
        Some(entries.iter().map(|e| e.key.clone()).collect::<Vec<_>>())
    };
    info!("Sources found: {:?}", sources);

    Json(ChatResponse {
        response,
        sources,
        session_id,
    })
}

pub async fn knowledge_handler(State(state): State<AppState>) -> Json<Vec<KnowledgeEntry>> {
    Json(state.knowledge.entries().to_vec())
}

pub async fn site_config_handler(State(state): State<AppState>) -> Json<SiteConfigResponse> {
    let kb = state.knowledge.knowledge_base();
    Json(SiteConfigResponse {
        title: kb.title.clone(),
        description: kb.description.clone(),
    })
}

pub async fn list_sessions_handler(State(state): State<AppState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.sessions().list_sessions(),
    })
}

pub async fn session_history_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<HistoryResponse> {
    let history = state.sessions().get_history(&session_id);
    Json(HistoryResponse {
        session_id,
        history,
    })
}

pub async fn clear_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<MessageResponse> {
    info!("Clearing session {}", session_id);
    state.sessions().clear(&session_id);
    Json(MessageResponse {
        message: format!("Session {} cleared", session_id),
    })
}
