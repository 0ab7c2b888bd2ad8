//! Indexing and similarity retrieval over the vector store

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorSearchResult, VectorStoreProvider};
use crate::types::Chunk;

/// Embed `chunks` in batches and add them to `store`
///
/// Returns the number of chunks indexed.
pub async fn index_chunks(
    chunks: Vec<Chunk>,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStoreProvider,
    batch_size: usize,
) -> Result<usize> {
    if batch_size == 0 {
        return Err(Error::config("Embedding batch size must be positive"));
    }

    let total = chunks.len();
    let mut remaining = chunks.into_iter();
    let mut indexed = 0;

    loop {
        let batch: Vec<Chunk> = remaining.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            break;
        }

        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                embedder.name(),
                embeddings.len(),
                batch.len()
            )));
        }

        indexed += batch.len();
        store.add(batch, embeddings).await?;
        tracing::debug!("Indexed {}/{} chunks into {}", indexed, total, store.name());
    }

    Ok(indexed)
}

/// Embeds a query and returns the nearest stored chunks
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Up to `top_k` chunks, most similar first
    pub async fn retrieve(&self, query: &str) -> Result<Vec<VectorSearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        let results = self.store.search(&query_embedding, self.top_k).await?;

        tracing::debug!("Retrieved {} chunks for query", results.len());
        Ok(results)
    }
}
