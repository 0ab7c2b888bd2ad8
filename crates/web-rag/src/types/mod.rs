//! Core types for documents, chunks and chat messages

pub mod document;
pub mod message;

pub use document::{Chunk, Document, PageContent};
pub use message::{ChatMessage, MessageChunk, Role};
