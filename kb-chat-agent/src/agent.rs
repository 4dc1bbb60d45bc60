//! Chat agent: prompt composition around the generation backend

use kb_chat_core::session::SessionStore;
use kb_chat_core::utils::truncate;
use kb_chat_providers::{LLMProvider, ProviderError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::context::PromptBuilder;

/// Prefix of the reply recorded when the backend fails
pub const ERROR_REPLY_PREFIX: &str = "Sorry, I encountered an error while processing your request: ";

/// Default upper bound on a single backend call
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of one exchange
#[derive(Debug)]
pub enum Reply {
    /// The backend produced an answer
    Answered(String),
    /// The backend failed; `text` is the apology shown to the user
    Degraded { text: String, cause: ProviderError },
}

impl Reply {
    fn degraded(cause: ProviderError) -> Self {
        Reply::Degraded {
            text: format!("{}{}", ERROR_REPLY_PREFIX, cause),
            cause,
        }
    }

    /// Text returned to the user and recorded in history
    pub fn text(&self) -> &str {
        match self {
            Reply::Answered(text) | Reply::Degraded { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Answered(text) | Reply::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Reply::Degraded { .. })
    }
}

/// Answers user messages with session memory.
///
/// The agent keeps no state of its own between calls; history lives in the
/// shared [`SessionStore`].
pub struct ChatAgent {
    provider: Arc<dyn LLMProvider>,
    sessions: Arc<SessionStore>,
    prompt: PromptBuilder,
    timeout: Duration,
}

impl ChatAgent {
    /// Create a new agent with the default render window and timeout
    pub fn new(provider: Arc<dyn LLMProvider>, sessions: Arc<SessionStore>) -> Self {
        Self {
            provider,
            sessions,
            prompt: PromptBuilder::default(),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Number of history turns rendered into each prompt
    pub fn with_render_window(mut self, render_window: usize) -> Self {
        self.prompt = PromptBuilder::new(render_window);
        self
    }

    /// Upper bound on a single backend call; a timeout counts as a backend failure
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Model name reported by the backend
    pub fn model(&self) -> String {
        self.provider.model()
    }

    /// Answer `user_text` in `session_id`, returning only the reply text.
    ///
    /// Never fails: backend errors come back as an apology that starts with
    /// [`ERROR_REPLY_PREFIX`].
    pub async fn respond(&self, user_text: &str, context: Option<&str>, session_id: &str) -> String {
        self.respond_detailed(user_text, context, session_id)
            .await
            .into_text()
    }

    /// Answer `user_text` in `session_id`.
    ///
    /// The user turn and the reply turn are recorded together whether or not
    /// the backend succeeded.
    pub async fn respond_detailed(
        &self,
        user_text: &str,
        context: Option<&str>,
        session_id: &str,
    ) -> Reply {
        info!(
            "Processing message in session {}: {} (model: {})",
            session_id,
            truncate(user_text, 80),
            self.provider.model()
        );

        let history = self.sessions.get_history(session_id);
        let prompt = self.prompt.build_prompt(user_text, context, &history);
        debug!(
            "Built prompt of {} chars from {} history turns",
            prompt.len(),
            history.len()
        );

        let reply = match tokio::time::timeout(self.timeout, self.provider.generate(&prompt)).await {
            Ok(Ok(text)) => Reply::Answered(text),
            Ok(Err(e)) => {
                warn!("Generation failed in session {}: {}", session_id, e);
                Reply::degraded(e)
            }
            Err(_) => {
                warn!(
                    "Generation timed out in session {} after {:?}",
                    session_id, self.timeout
                );
                Reply::degraded(ProviderError::Timeout(self.timeout))
            }
        };

        self.sessions
            .append_exchange(session_id, user_text, reply.text());
        debug!("Generated response of {} chars", reply.text().len());

        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kb_chat_core::session::Role;
    use kb_chat_providers::ProviderResult;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Backend that replays scripted outcomes and records every prompt
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<ProviderResult<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn with(replies: Vec<ProviderResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn generate(&self, prompt: &str) -> ProviderResult<String> {
            self.prompts.lock().push(prompt.to_string());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok("ok".to_string()))
        }

        fn model(&self) -> String {
            "scripted".to_string()
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LLMProvider for SlowProvider {
        async fn generate(&self, _prompt: &str) -> ProviderResult<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }

        fn model(&self) -> String {
            "slow".to_string()
        }
    }

    fn agent(provider: Arc<dyn LLMProvider>) -> ChatAgent {
        ChatAgent::new(provider, Arc::new(SessionStore::default()))
    }

    #[tokio::test]
    async fn test_success_then_failure_scenario() {
        let provider = ScriptedProvider::with(vec![
            Ok("Hello!".to_string()),
            Err(ProviderError::ApiError("rate limited".to_string())),
        ]);
        let agent = agent(provider.clone());

        let reply = agent.respond("Hi", None, "s1").await;
        assert_eq!(reply, "Hello!");

        let history = agent.sessions().get_history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].role, history[0].content.as_str()), (Role::User, "Hi"));
        assert_eq!((history[1].role, history[1].content.as_str()), (Role::Model, "Hello!"));

        let reply = agent.respond("Again", None, "s1").await;
        assert_eq!(
            reply,
            "Sorry, I encountered an error while processing your request: rate limited"
        );

        let history = agent.sessions().get_history("s1");
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].content, "Again");
        assert_eq!(history[3].role, Role::Model);
        assert_eq!(history[3].content, reply);

        // The second prompt saw the first exchange
        let prompts = provider.prompts();
        assert!(prompts[1].contains("Previous conversation:\nUser: Hi\nAssistant: Hello!\n\n"));
    }

    #[tokio::test]
    async fn test_first_prompt_has_no_optional_blocks() {
        let provider = ScriptedProvider::with(vec![]);
        let agent = agent(provider.clone());

        agent.respond("Where are you?", Some(""), "fresh").await;

        let prompt = &provider.prompts()[0];
        assert!(!prompt.contains("Knowledge Base Context"));
        assert!(!prompt.contains("Previous conversation"));
        assert!(prompt.contains("Current User Question: Where are you?"));
        assert!(prompt.ends_with(crate::context::RESPONSE_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_context_is_prepended() {
        let provider = ScriptedProvider::with(vec![]);
        let agent = agent(provider.clone());

        agent
            .respond("hours?", Some("**Hours:**\n9-5\n\n"), "s")
            .await;

        assert!(provider.prompts()[0].starts_with("Knowledge Base Context:\n**Hours:**\n9-5"));
    }

    #[tokio::test]
    async fn test_each_respond_appends_exactly_two_turns() {
        let provider = ScriptedProvider::with(vec![
            Ok("a".to_string()),
            Err(ProviderError::InvalidResponse("empty".to_string())),
            Ok("c".to_string()),
        ]);
        let agent = agent(provider);

        for (i, text) in ["one", "", "three"].iter().enumerate() {
            agent.respond(text, None, "count").await;
            assert_eq!(agent.sessions().get_history("count").len(), (i + 1) * 2);
        }

        let history = agent.sessions().get_history("count");
        assert_eq!(history[2].content, "");
        assert_eq!(history[2].role, Role::User);
    }

    #[tokio::test]
    async fn test_render_window_limits_prompt_history() {
        let provider = ScriptedProvider::with(vec![]);
        let sessions = Arc::new(SessionStore::default());
        for i in 1..=15 {
            sessions.append("long", Role::User, format!("turn {}", i));
        }
        let agent = ChatAgent::new(provider.clone(), sessions);

        agent.respond("next", None, "long").await;

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("User: turn 6\n"));
        assert!(prompt.contains("User: turn 15\n"));
        assert!(!prompt.contains("User: turn 5\n"));
        assert!(prompt.find("turn 6").unwrap() < prompt.find("turn 15").unwrap());
    }

    #[tokio::test]
    async fn test_retention_applies_to_exchanges() {
        let agent = agent(ScriptedProvider::with(vec![]));
        for i in 0..15 {
            agent.respond(&format!("q{}", i), None, "s").await;
        }

        let history = agent.sessions().get_history("s");
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].content, "q5");
    }

    #[tokio::test]
    async fn test_timeout_is_degraded_reply() {
        let agent = agent(Arc::new(SlowProvider)).with_timeout(Duration::from_millis(20));

        let reply = agent.respond_detailed("Hi", None, "slow").await;

        assert!(reply.is_degraded());
        assert!(reply.text().starts_with(ERROR_REPLY_PREFIX));
        assert!(matches!(
            reply,
            Reply::Degraded {
                cause: ProviderError::Timeout(_),
                ..
            }
        ));
        assert_eq!(agent.sessions().get_history("slow").len(), 2);
    }

    #[tokio::test]
    async fn test_answered_reply_is_not_degraded() {
        let agent = agent(ScriptedProvider::with(vec![Ok("fine".to_string())]));
        let reply = agent.respond_detailed("Hi", None, "s").await;
        assert!(!reply.is_degraded());
        assert_eq!(reply.text(), "fine");
    }
}
