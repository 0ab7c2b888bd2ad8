//! Web page loading with class-based content filtering

use async_trait::async_trait;
use reqwest::Client;
use scraper::{node::Element, ElementRef, Html, Selector};
use std::time::Duration;

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::types::Document;

/// Tags whose text never reaches the document
const SKIPPED_TAGS: [&str; 3] = ["script", "style", "template"];

/// Trait for producing documents to index
///
/// Implementations:
/// - `WebLoader`: fetches and filters HTML pages
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load all documents
    async fn load(&self) -> Result<Vec<Document>>;

    /// Get loader name for logging
    fn name(&self) -> &str;
}

/// Loads web pages, keeping only text inside elements with the configured classes
pub struct WebLoader {
    client: Client,
    config: LoaderConfig,
}

impl WebLoader {
    /// Create a new web loader
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Fetch and filter a single page
    async fn load_url(&self, url: &str) -> Result<Document> {
        tracing::info!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::load(url, e.to_string()))?;

        let status = response.status();
        if self.config.raise_for_status && !status.is_success() {
            return Err(Error::load(url, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::load(url, e.to_string()))?;

        tracing::debug!("Fetched {} bytes from {} (HTTP {})", body.len(), url, status);

        let doc = extract_document(url, &body, &self.config.classes)?;
        if doc.content.trim().is_empty() {
            tracing::warn!("No text matched classes {:?} at {}", self.config.classes, url);
        }

        Ok(doc)
    }
}

#[async_trait]
impl DocumentLoader for WebLoader {
    async fn load(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::with_capacity(self.config.urls.len());
        for url in &self.config.urls {
            docs.push(self.load_url(url).await?);
        }
        Ok(docs)
    }

    fn name(&self) -> &str {
        "web"
    }
}

/// Build a document from raw HTML
///
/// Text of every outermost element carrying one of `classes` is concatenated
/// in document order. An empty class list keeps the whole page.
pub fn extract_document(url: &str, html: &str, classes: &[String]) -> Result<Document> {
    let page = Html::parse_document(html);
    let mut content = String::new();

    if classes.is_empty() {
        push_text(page.root_element(), &mut content);
    } else {
        let css = classes
            .iter()
            .map(|class| format!(".{}", class))
            .collect::<Vec<_>>()
            .join(", ");
        let selector = selector(&css)?;

        for element in page.select(&selector) {
            let nested = element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| has_any_class(ancestor.value(), classes));
            if !nested {
                push_text(element, &mut content);
            }
        }
    }

    // Metadata is read from the whole page; the class filter usually drops <head>
    let title = page
        .select(&selector("title")?)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No title found.".to_string());

    let description = page
        .select(&selector(r#"meta[name="description"]"#)?)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::to_string)
        .unwrap_or_else(|| "No description found.".to_string());

    let language = page
        .root_element()
        .value()
        .attr("lang")
        .map(str::to_string)
        .unwrap_or_else(|| "No language found.".to_string());

    Ok(Document::new(content)
        .with_metadata("source", url)
        .with_metadata("title", title)
        .with_metadata("description", description)
        .with_metadata("language", language))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::config(format!("Invalid selector '{}': {}", css, e)))
}

fn has_any_class(element: &Element, classes: &[String]) -> bool {
    element
        .classes()
        .any(|class| classes.iter().any(|wanted| wanted == class))
}

/// Append every visible text node below `element`
fn push_text(element: ElementRef<'_>, out: &mut String) {
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| SKIPPED_TAGS.contains(&a.value().name()));
        if !hidden {
            out.push_str(text);
        }
    }
}
