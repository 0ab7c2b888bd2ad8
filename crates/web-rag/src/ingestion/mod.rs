//! Document ingestion: page loading and chunking

pub mod chunker;
pub mod loader;

pub use chunker::{RecursiveTextSplitter, DEFAULT_SEPARATORS};
pub use loader::{extract_document, DocumentLoader, WebLoader};
