//! Context builder for assembling prompts

use kb_chat_core::session::Turn;

/// Number of most recent turns rendered into a prompt by default
pub const DEFAULT_RENDER_WINDOW: usize = 10;

/// Closing instruction appended to every prompt
pub const RESPONSE_INSTRUCTION: &str = "Please provide a helpful response based on the context and conversation history above. If the context doesn't contain relevant information, provide a general helpful response. Maintain conversation continuity.";

/// Builds the single text prompt sent to the generation backend.
///
/// Sections always appear in the same order: knowledge context, previous
/// conversation, current question, instruction. Empty sections are omitted.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    render_window: usize,
}

impl PromptBuilder {
    /// Create a builder rendering at most `render_window` history turns
    /// (at least one)
    pub fn new(render_window: usize) -> Self {
        Self {
            render_window: render_window.max(1),
        }
    }

    pub fn render_window(&self) -> usize {
        self.render_window
    }

    /// Render the tail of the history as a transcript, or an empty string
    /// for an empty history
    pub fn build_conversation(&self, history: &[Turn]) -> String {
        if history.is_empty() {
            return String::new();
        }

        let start = history.len().saturating_sub(self.render_window);
        let mut block = String::from("Previous conversation:\n");
        for turn in &history[start..] {
            block.push_str(&format!("{}: {}\n", turn.role.label(), turn.content));
        }
        block.push('\n');
        block
    }

    /// Build the complete prompt for one question
    pub fn build_prompt(&self, user_text: &str, context: Option<&str>, history: &[Turn]) -> String {
        let mut prompt = String::new();

        if let Some(context) = context.filter(|c| !c.is_empty()) {
            prompt.push_str(&format!("Knowledge Base Context:\n{}\n\n", context));
        }

        prompt.push_str(&self.build_conversation(history));

        prompt.push_str(&format!("Current User Question: {}\n\n", user_text));
        prompt.push_str(RESPONSE_INSTRUCTION);

        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_WINDOW)
    }
}
