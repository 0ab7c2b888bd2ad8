//! Output parsing for streamed chat responses

use futures::stream::BoxStream;
use futures::{future, StreamExt, TryStreamExt};

use crate::error::Result;
use crate::providers::ChunkStream;
use crate::types::MessageChunk;

/// Stream of plain-text answer fragments
pub type AnswerStream = BoxStream<'static, Result<String>>;

/// Reduces message chunks to their text content
#[derive(Debug, Clone, Copy, Default)]
pub struct StrOutputParser;

impl StrOutputParser {
    pub fn new() -> Self {
        Self
    }

    /// Text of a single chunk; role-only and finish chunks carry none
    pub fn parse(&self, chunk: MessageChunk) -> Option<String> {
        if chunk.content.is_empty() {
            None
        } else {
            Some(chunk.content)
        }
    }

    /// Map a chunk stream to text fragments, preserving order and errors
    pub fn transform(&self, chunks: ChunkStream) -> AnswerStream {
        let parser = *self;
        chunks
            .try_filter_map(move |chunk| future::ready(Ok(parser.parse(chunk))))
            .boxed()
    }
}
