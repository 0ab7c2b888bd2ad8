//! The question-answering chain
//!
//! A question flows through retrieval, context formatting, prompt filling,
//! the chat model and the output parser. Every call retrieves afresh.

pub mod format;

pub use format::{format_docs, DOC_SEPARATOR};

use futures::TryStreamExt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::{AnswerStream, ChatPromptTemplate, StrOutputParser};
use crate::providers::LlmProvider;
use crate::retrieval::Retriever;

/// Slot filled with the formatted retrieved chunks
pub const CONTEXT_KEY: &str = "context";
/// Slot filled with the raw question
pub const QUESTION_KEY: &str = "question";

/// Retrieval-augmented answer chain
pub struct RagChain {
    retriever: Retriever,
    prompt: ChatPromptTemplate,
    llm: Arc<dyn LlmProvider>,
    parser: StrOutputParser,
}

impl RagChain {
    /// Build a chain; the prompt may only use the `context` and `question` slots
    pub fn new(
        retriever: Retriever,
        prompt: ChatPromptTemplate,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        if let Some(unknown) = prompt
            .input_variables()
            .into_iter()
            .find(|name| *name != CONTEXT_KEY && *name != QUESTION_KEY)
        {
            return Err(Error::prompt(format!(
                "Prompt slot '{}' cannot be filled; expected only '{}' and '{}'",
                unknown, CONTEXT_KEY, QUESTION_KEY
            )));
        }

        Ok(Self {
            retriever,
            prompt,
            llm,
            parser: StrOutputParser::new(),
        })
    }

    /// Answer `question` as a stream of text fragments
    pub async fn stream(&self, question: &str) -> Result<AnswerStream> {
        let docs = self.retriever.retrieve(question).await?;
        let context = format_docs(&docs);

        tracing::info!(
            "Answering with {} retrieved chunks ({} chars of context)",
            docs.len(),
            context.chars().count()
        );

        let messages = self
            .prompt
            .format_messages(&[(CONTEXT_KEY, context.as_str()), (QUESTION_KEY, question)])?;
        let chunks = self.llm.stream_chat(&messages).await?;

        Ok(self.parser.transform(chunks))
    }

    /// Answer `question`, collecting the whole reply
    pub async fn invoke(&self, question: &str) -> Result<String> {
        self.stream(question).await?.try_collect().await
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn llm(&self) -> &dyn LlmProvider {
        self.llm.as_ref()
    }
}
