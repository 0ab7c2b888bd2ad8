//! Answer generation: prompt templates, completion streaming and output parsing

pub mod hub;
pub mod parser;
pub mod prompt;
pub mod stream;

pub use hub::PromptHub;
pub use parser::{AnswerStream, StrOutputParser};
pub use prompt::{rag_prompt, ChatPromptTemplate, PromptTemplate, RAG_PROMPT_TEMPLATE};
pub use stream::{SseDecoder, SseEvent};

use crate::config::{PromptConfig, PromptSource};
use crate::error::Result;

/// Resolve the chat prompt named by `config`
pub async fn load_prompt(config: &PromptConfig) -> Result<ChatPromptTemplate> {
    match config.source {
        PromptSource::Hub => PromptHub::new(config)?.pull(&config.name).await,
        PromptSource::Builtin => {
            tracing::info!("Using bundled RAG prompt");
            rag_prompt()
        }
    }
}
