use crate::models::*;

pub const RAG_SYSTEM_PROMPT: &str = "You are a helpful chatbot. Based ONLY on the following context, please answer the user's question. If the context does not contain the answer, state that you do not have enough information to answer.";

/// Joins retrieved chunks into the context block.
pub const CONTEXT_SEPARATOR: &str = " ";

/// Builds the two prompt shapes the chat endpoint sends.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptComposer;

impl PromptComposer {
    pub fn new() -> Self {
        Self
    }

    /// A single user message carrying the raw question, no system prompt.
    pub fn direct(&self, question: &str) -> Prompt {
        Prompt {
            system: None,
            messages: vec![Message {
                role: Role::User,
                content: MessageContent::Text(question.to_string()),
            }],
        }
    }

    /// Context-constrained prompt: fixed system instruction plus one user text
    /// block with the retrieved context in a `<context>` tag, then the question.
    pub fn augmented(&self, question: &str, retrieved: &[ScoredChunk]) -> Prompt {
        let context = self.build_context(retrieved);
        let text = format!("<context>\n{context}\n</context>\n\nQuestion: {question}");

        Prompt {
            system: Some(RAG_SYSTEM_PROMPT.to_string()),
            messages: vec![Message {
                role: Role::User,
                content: MessageContent::Blocks(vec![ContentBlock::Text { text }]),
            }],
        }
    }

    pub fn build_context(&self, retrieved: &[ScoredChunk]) -> String {
        retrieved
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }
}
