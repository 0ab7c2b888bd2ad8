//! Question-answering binary
//!
//! Run with: OPENAI_API_KEY=... cargo run -p web-rag

use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web_rag::{Pipeline, RagConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Warning: failed to load .env file: {}", err);
        }
    }

    // Initialize tracing; stdout is reserved for the answer
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::var_os("WEB_RAG_CONFIG").map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Pages: {}", config.loader.urls.join(", "));
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    let chain = Pipeline::from_config(&config).await?;
    tracing::info!(
        "Asking {} with top {} chunks: {}",
        chain.llm().model(),
        chain.retriever().top_k(),
        config.question
    );

    let mut answer = chain.stream(&config.question).await?;

    let mut stdout = std::io::stdout();
    while let Some(fragment) = answer.next().await {
        write!(stdout, "{}", fragment?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}
