//! Agent logic for kb-chat
//!
//! This crate assembles prompts from session history and knowledge context
//! and records each exchange back into the session store.

pub mod agent;
pub mod context;

pub use agent::{ChatAgent, Reply, DEFAULT_GENERATION_TIMEOUT, ERROR_REPLY_PREFIX};
pub use context::{PromptBuilder, DEFAULT_RENDER_WINDOW, RESPONSE_INSTRUCTION};
