//! web-rag: Minimal retrieval-augmented question answering over web pages
//!
//! Pages are fetched and filtered by CSS class, split into overlapping chunks,
//! embedded into an in-memory vector store, and queried through a chain that
//! retrieves context, fills a prompt and streams the chat model's answer.

pub mod chain;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use chain::{format_docs, RagChain};
pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use types::{Chunk, Document};
