//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, PageContent};

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Distance to the query under the store's metric (lower is closer)
    pub distance: f32,
    /// Relevance score derived from the distance (higher is more similar)
    pub similarity: f32,
}

impl PageContent for VectorSearchResult {
    fn page_content(&self) -> &str {
        &self.chunk.content
    }
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `InMemoryVectorStore`: exact search over a process-local index
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Store chunks alongside their embeddings (same length, same order)
    async fn add(&self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()>;

    /// Return the `top_k` chunks nearest to `query_embedding`, nearest first
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
