//! Configuration for the RAG pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Question answered by the binary
    pub question: String,
    /// Web loader configuration
    pub loader: LoaderConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chat model configuration
    pub llm: LlmConfig,
    /// OpenAI-compatible API connection
    pub openai: OpenAiConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Prompt template configuration
    pub prompt: PromptConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then overlay the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config: RagConfig = toml::from_str(&raw)?;
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            None => RagConfig::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay values taken from process environment variables
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Ok(org) = std::env::var("OPENAI_ORG_ID") {
            self.openai.organization = Some(org);
        }

        if let Some(key) = std::env::var("LANGSMITH_API_KEY")
            .ok()
            .or_else(|| std::env::var("LANGCHAIN_API_KEY").ok())
        {
            self.prompt.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("LANGSMITH_ENDPOINT") {
            self.prompt.api_url = url;
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(Error::config("question must not be empty"));
        }
        if self.loader.urls.is_empty() {
            return Err(Error::config("loader.urls must contain at least one URL"));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be positive"));
        }
        if self.chunking.chunk_overlap > self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunking.chunk_overlap ({}) is larger than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::config("embeddings.batch_size must be positive"));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be positive"));
        }
        Ok(())
    }
}

/// Web page loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Pages to fetch
    pub urls: Vec<String>,
    /// Keep only text inside elements carrying one of these classes (empty = whole page)
    pub classes: Vec<String>,
    /// User-Agent header sent with page requests
    pub user_agent: String,
    /// Fail on non-2xx responses instead of parsing whatever came back
    pub raise_for_status: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            urls: vec!["https://lilianweng.github.io/posts/2023-06-23-agent/".to_string()],
            classes: vec![
                "post-content".to_string(),
                "post-title".to_string(),
                "post-header".to_string(),
            ],
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            raise_for_status: false,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Texts sent per embeddings request
    pub batch_size: usize,
    /// Requested output dimensions (only honoured by newer models)
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            batch_size: 1000,
            dimensions: None,
        }
    }
}

/// Chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-0125".to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

/// OpenAI-compatible API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL
    pub base_url: String,
    /// API key (read from `OPENAI_API_KEY`, never from the file)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Organization header
    pub organization: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            organization: None,
            timeout_secs: 120,
        }
    }
}

/// Distance used to rank stored chunks against a query
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared euclidean distance
    #[default]
    L2,
    /// One minus cosine similarity
    Cosine,
    /// One minus inner product
    Ip,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the prompt
    pub top_k: usize,
    /// Distance metric of the in-memory store
    pub metric: DistanceMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            metric: DistanceMetric::L2,
        }
    }
}

/// Where the prompt template comes from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptSource {
    /// Pull from the remote prompt registry
    #[default]
    Hub,
    /// Use the bundled RAG prompt
    Builtin,
}

/// Prompt template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Template source
    pub source: PromptSource,
    /// Registry handle, `owner/name`
    pub name: String,
    /// Registry API base URL
    pub api_url: String,
    /// Registry API key (read from the environment)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            source: PromptSource::Hub,
            name: "rlm/rag-prompt".to_string(),
            api_url: "https://api.smith.langchain.com".to_string(),
            api_key: None,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            question: "What is Task Decomposition?".to_string(),
            loader: LoaderConfig::default(),
            chunking: ChunkingConfig::default(),
            embeddings: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            openai: OpenAiConfig::default(),
            retrieval: RetrievalConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}
