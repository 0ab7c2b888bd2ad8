//! Provider abstractions for embeddings, chat models and vector storage
//!
//! Each external service sits behind a trait so the chain can run against
//! the hosted OpenAI API or against in-process fakes.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod openai;
pub mod vector_store;

#[cfg(test)]
pub mod fake;

pub use embedding::EmbeddingProvider;
pub use llm::{ChunkStream, LlmProvider};
pub use local::InMemoryVectorStore;
pub use openai::OpenAiClient;
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
