//! Process-local vector store with exact nearest-neighbour search

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::DistanceMetric;
use crate::error::{Error, Result};
use crate::types::Chunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

struct StoredChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

#[derive(Default)]
struct Index {
    /// Fixed by the first insert
    dimensions: Option<usize>,
    entries: Vec<StoredChunk>,
}

/// In-memory vector store
///
/// Lives as long as the process; nothing is evicted or updated in place.
pub struct InMemoryVectorStore {
    metric: DistanceMetric,
    index: RwLock<Index>,
}

impl InMemoryVectorStore {
    /// Create an empty store ranking by `metric`
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            index: RwLock::new(Index::default()),
        }
    }

    /// Distance metric used for ranking
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Embedding dimensions, once known
    pub fn dimensions(&self) -> Option<usize> {
        self.index.read().dimensions
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new(DistanceMetric::default())
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn add(&self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let Some(first) = embeddings.first() else {
            return Ok(());
        };

        // Whole batch is checked before anything is stored
        let mut index = self.index.write();
        let dims = index.dimensions.unwrap_or(first.len());
        for (chunk, embedding) in chunks.iter().zip(&embeddings) {
            if embedding.is_empty() {
                return Err(Error::vector_db(format!("Chunk {} has no embedding", chunk.id)));
            }
            if embedding.len() != dims {
                return Err(Error::vector_db(format!(
                    "Embedding has {} dimensions, store expects {}",
                    embedding.len(),
                    dims
                )));
            }
        }

        index.dimensions = Some(dims);
        index.entries.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| StoredChunk { chunk, embedding }),
        );

        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let index = self.index.read();

        if let Some(dims) = index.dimensions {
            if query_embedding.len() != dims {
                return Err(Error::vector_db(format!(
                    "Query has {} dimensions, store expects {}",
                    query_embedding.len(),
                    dims
                )));
            }
        }

        let mut scored: Vec<(f32, &StoredChunk)> = index
            .entries
            .iter()
            .map(|entry| (distance(self.metric, query_embedding, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(distance, entry)| VectorSearchResult {
                chunk: entry.chunk.clone(),
                distance,
                similarity: similarity(self.metric, distance),
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.index.read().entries.len())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Distance under `metric`; lower is closer
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
        DistanceMetric::Cosine => {
            let norms = dot(a, a).sqrt() * dot(b, b).sqrt();
            if norms == 0.0 {
                1.0
            } else {
                1.0 - dot(a, b) / norms
            }
        }
        DistanceMetric::Ip => 1.0 - dot(a, b),
    }
}

fn similarity(metric: DistanceMetric, distance: f32) -> f32 {
    match metric {
        DistanceMetric::L2 => 1.0 / (1.0 + distance),
        DistanceMetric::Cosine | DistanceMetric::Ip => 1.0 - distance,
    }
}
