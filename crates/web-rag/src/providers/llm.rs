//! Chat model provider trait for streamed answer generation

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{ChatMessage, MessageChunk};

/// Raw increments of a streamed model reply
pub type ChunkStream = BoxStream<'static, Result<MessageChunk>>;

/// Trait for chat-completion models
///
/// Implementations:
/// - `OpenAiClient`: hosted `/chat/completions` endpoint with server-sent events
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Start a streamed completion for `messages`
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
