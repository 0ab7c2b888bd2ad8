//! Wiring of configuration, providers and ingestion into a ready chain

use std::sync::Arc;

use crate::chain::RagChain;
use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{load_prompt, ChatPromptTemplate};
use crate::ingestion::{DocumentLoader, RecursiveTextSplitter, WebLoader};
use crate::providers::{
    EmbeddingProvider, InMemoryVectorStore, LlmProvider, OpenAiClient, VectorStoreProvider,
};
use crate::retrieval::{index_chunks, Retriever};

/// Builds a [`RagChain`] by running ingestion once up front
pub struct Pipeline;

impl Pipeline {
    /// Assemble the hosted pipeline described by `config`
    ///
    /// Loads the pages, indexes them into an in-memory store and fetches the
    /// prompt before returning.
    pub async fn from_config(config: &RagConfig) -> Result<RagChain> {
        let openai = Arc::new(OpenAiClient::new(config)?);
        let loader = WebLoader::new(&config.loader)?;
        let store = Arc::new(InMemoryVectorStore::new(config.retrieval.metric));
        let prompt = load_prompt(&config.prompt).await?;

        let chain =
            Self::assemble(config, &loader, openai.clone(), store.clone(), openai, prompt).await?;

        tracing::info!(
            "Vector store ready: {:?} metric, {} dimensions",
            store.metric(),
            store
                .dimensions()
                .map_or_else(|| "unknown".to_string(), |d| d.to_string())
        );
        Ok(chain)
    }

    /// Ingest with `loader` and build a chain over the given providers
    pub async fn assemble(
        config: &RagConfig,
        loader: &dyn DocumentLoader,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        prompt: ChatPromptTemplate,
    ) -> Result<RagChain> {
        let docs = loader.load().await?;
        let text_len: usize = docs.iter().map(|d| d.content.chars().count()).sum();
        tracing::info!(
            "Loaded {} documents ({} chars) via {}",
            docs.len(),
            text_len,
            loader.name()
        );

        let splitter = RecursiveTextSplitter::from_config(&config.chunking)?;
        let chunks = splitter.split_documents(&docs);
        tracing::info!(
            "Split into {} chunks (size {}, overlap {})",
            chunks.len(),
            config.chunking.chunk_size,
            config.chunking.chunk_overlap
        );

        let indexed = index_chunks(
            chunks,
            embedder.as_ref(),
            store.as_ref(),
            config.embeddings.batch_size,
        )
        .await?;
        tracing::info!("Indexed {} chunks with {} into {}", indexed, embedder.name(), store.name());

        let retriever = Retriever::new(embedder, store, config.retrieval.top_k);
        RagChain::new(retriever, prompt, llm)
    }
}
