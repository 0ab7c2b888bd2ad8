//! Document and chunk types with source metadata

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Anything that exposes a block of page text
pub trait PageContent {
    /// Text content used for prompting
    fn page_content(&self) -> &str;
}

/// A loaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Extracted text
    pub content: String,
    /// Source metadata (`source`, `title`, ...)
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a new document with empty metadata
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Origin address, if recorded
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }
}

impl PageContent for Document {
    fn page_content(&self) -> &str {
        &self.content
    }
}

/// A bounded slice of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Chunk text
    pub content: String,
    /// Metadata inherited from the parent document
    pub metadata: HashMap<String, String>,
    /// Position of the chunk within its document
    pub chunk_index: u32,
    /// Byte offset of the chunk in the parent content, if it could be located
    pub start_index: Option<usize>,
}

impl Chunk {
    /// Create a new chunk of `doc`
    pub fn new(
        doc: &Document,
        content: String,
        chunk_index: u32,
        start_index: Option<usize>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: doc.id,
            content,
            metadata: doc.metadata.clone(),
            chunk_index,
            start_index,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

impl PageContent for Chunk {
    fn page_content(&self) -> &str {
        &self.content
    }
}

impl PageContent for String {
    fn page_content(&self) -> &str {
        self
    }
}

impl PageContent for &str {
    fn page_content(&self) -> &str {
        self
    }
}
