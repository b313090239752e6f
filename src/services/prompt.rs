use crate::models::{Chunk, ChatMessage};

/// Separator placed between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

const CONTEXT_HEADER: &str = "Context information is below:\n\n";

/// Builds the message list for one question: instructions, context, question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system_prompt: String,
}

impl PromptTemplate {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Chunk contents in retrieval order, joined by [`CONTEXT_SEPARATOR`].
    pub fn context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(Chunk::content)
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    pub fn render(&self, question: &str, chunks: &[Chunk]) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::system(format!("{CONTEXT_HEADER}{}", Self::context(chunks))),
            ChatMessage::user(question),
        ]
    }
}
