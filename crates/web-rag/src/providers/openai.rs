//! OpenAI-compatible client for embeddings and streamed chat completions

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::stream::{SseDecoder, SseEvent};
use crate::types::{ChatMessage, MessageChunk, Role};

use super::embedding::EmbeddingProvider;
use super::llm::{ChunkStream, LlmProvider};

/// Client for the OpenAI REST API (or any server speaking the same protocol)
///
/// One HTTP client is shared by the embedding and chat halves.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    embed_model: String,
    embed_dimensions: Option<usize>,
    chat_model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct StreamPayload {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    role: Option<Role>,
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiClient {
    /// Create a new client; the API key must already be in `config.openai`
    pub fn new(config: &RagConfig) -> Result<Self> {
        let api_key = config
            .openai
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("OPENAI_API_KEY is not set"))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| Error::config(format!("Invalid API key: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        if let Some(org) = &config.openai.organization {
            let value = HeaderValue::from_str(org)
                .map_err(|e| Error::config(format!("Invalid organization: {}", e)))?;
            headers.insert("OpenAI-Organization", value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.openai.base_url.trim_end_matches('/').to_string(),
            embed_model: config.embeddings.model.clone(),
            embed_dimensions: config.embeddings.dimensions,
            chat_model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::embedding("Empty embeddings response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.embed_model,
            input: texts,
            dimensions: self.embed_dimensions,
        };

        tracing::debug!("Embedding {} texts with {}", texts.len(), self.embed_model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!("HTTP {} - {}", status, body)));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        order_embeddings(body, texts.len())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            stream: true,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::info!("Generating answer with model: {}", self.chat_model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Stream request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!("Stream failed: HTTP {} - {}", status, body)));
        }

        let mut body = response.bytes_stream();

        let stream = try_stream! {
            let mut decoder = SseDecoder::new();
            let mut done = false;

            while !done {
                let events = match body.next().await {
                    Some(bytes) => {
                        let bytes = bytes.map_err(|e| Error::llm(format!("Stream error: {}", e)))?;
                        decoder.feed(&bytes)
                    }
                    None => {
                        done = true;
                        decoder.finish()
                    }
                };

                for event in events {
                    match event {
                        SseEvent::Done => {
                            done = true;
                            break;
                        }
                        SseEvent::Data(data) => {
                            if let Some(chunk) = parse_stream_chunk(&data)? {
                                yield chunk;
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.chat_model
    }
}

/// Put embeddings back in input order and check none went missing
fn order_embeddings(mut body: EmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if body.data.len() != expected {
        return Err(Error::embedding(format!(
            "Requested {} embeddings, received {}",
            expected,
            body.data.len()
        )));
    }
    body.data.sort_by_key(|d| d.index);
    Ok(body.data.into_iter().map(|d| d.embedding).collect())
}

/// Decode one `chat.completion.chunk` payload
///
/// Payloads without choices (usage reports) yield nothing; an `error`
/// object aborts the stream.
fn parse_stream_chunk(data: &str) -> Result<Option<MessageChunk>> {
    let payload: StreamPayload = serde_json::from_str(data)?;

    if let Some(error) = payload.error {
        return Err(Error::llm(error.message));
    }

    Ok(payload.choices.into_iter().next().map(|choice| MessageChunk {
        role: choice.delta.role,
        content: choice.delta.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::StrOutputParser;
    use crate::providers::fake::{http_response, serve_once, sse_head};
    use futures::TryStreamExt;

    #[test]
    fn test_parse_content_delta() {
        let data = r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Task"},"finish_reason":null}]}"#;

        let chunk = parse_stream_chunk(data).unwrap().unwrap();

        assert_eq!(chunk, MessageChunk::text("Task"));
    }

    #[test]
    fn test_parse_role_and_finish_chunks() {
        let first = r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#;
        let last = r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;

        let first = parse_stream_chunk(first).unwrap().unwrap();
        let last = parse_stream_chunk(last).unwrap().unwrap();

        assert_eq!(first.role, Some(Role::Assistant));
        assert!(first.content.is_empty());
        assert_eq!(last.finish_reason.as_deref(), Some("stop"));
        assert!(last.content.is_empty());
    }

    #[test]
    fn test_usage_chunk_yields_nothing() {
        let data = r#"{"choices":[],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#;
        assert!(parse_stream_chunk(data).unwrap().is_none());
    }

    #[test]
    fn test_error_payload_aborts() {
        let data = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;

        let err = parse_stream_chunk(data).unwrap_err();

        assert!(matches!(err, Error::Llm(msg) if msg.contains("Rate limit")));
    }

    #[test]
    fn test_embeddings_reordered_by_index() {
        let body: EmbedResponse = serde_json::from_str(
            r#"{"object":"list","data":[
                {"object":"embedding","index":1,"embedding":[0.0,1.0]},
                {"object":"embedding","index":0,"embedding":[1.0,0.0]}
            ],"model":"text-embedding-ada-002"}"#,
        )
        .unwrap();

        let embeddings = order_embeddings(body, 2).unwrap();

        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_missing_embeddings_rejected() {
        let body: EmbedResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#).unwrap();
        assert!(order_embeddings(body, 2).is_err());
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let mut config = RagConfig::default();
        config.openai.api_key = None;

        assert!(matches!(OpenAiClient::new(&config), Err(Error::Config(_))));
    }

    fn client_for(base_url: &str) -> OpenAiClient {
        let mut config = RagConfig::default();
        config.openai.base_url = base_url.to_string();
        config.openai.api_key = Some("test-key".to_string());
        OpenAiClient::new(&config).unwrap()
    }

    fn delta(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{}\"}},\"finish_reason\":null}}]}}\n\n",
            content
        )
    }

    #[tokio::test]
    async fn test_stream_stops_at_done_marker() {
        let first = format!(
            "data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"role\":\"assistant\",\"content\":\"\"}}}}]}}\n\n{}da",
            delta("Task ")
        );
        let second = format!(
            "ta: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"decomposition\"}}}}]}}\n\n\
             data: {{\"choices\":[{{\"index\":0,\"delta\":{{}},\"finish_reason\":\"stop\"}}]}}\n\n\
             data: [DONE]\n\n{}",
            delta("after the end")
        );
        let (url, server) =
            serve_once(vec![sse_head(), first.into_bytes(), second.into_bytes()]).await;
        let client = client_for(&url);

        let chunks = client.stream_chat(&[ChatMessage::user("hi")]).await.unwrap();
        let fragments: Vec<String> = StrOutputParser::new()
            .transform(chunks)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(fragments, vec!["Task ", "decomposition"]);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /chat/completions "));
        assert!(request.contains("authorization: bearer test-key"));
        assert!(request.contains("\"stream\":true"));
    }

    #[tokio::test]
    async fn test_stream_flushes_unterminated_event_at_end_of_body() {
        let body = format!(
            "{}data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"end\"}}}}]}}",
            delta("the ")
        );
        let (url, _server) = serve_once(vec![sse_head(), body.into_bytes()]).await;
        let client = client_for(&url);

        let chunks = client.stream_chat(&[ChatMessage::user("hi")]).await.unwrap();
        let answer: String = StrOutputParser::new()
            .transform(chunks)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(answer, "the end");
    }

    #[tokio::test]
    async fn test_rate_limited_stream_is_llm_error() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
        let (url, _server) = serve_once(vec![http_response(
            "429 Too Many Requests",
            "application/json",
            body,
        )])
        .await;
        let client = client_for(&url);

        let result = client.stream_chat(&[ChatMessage::user("hi")]).await;

        assert!(matches!(
            result,
            Err(Error::Llm(msg)) if msg.contains("429") && msg.contains("Rate limit")
        ));
    }

    #[tokio::test]
    async fn test_embeddings_request() {
        let body = r#"{"data":[
            {"index":1,"embedding":[0.0,1.0]},
            {"index":0,"embedding":[1.0,0.0]}
        ]}"#;
        let (url, server) =
            serve_once(vec![http_response("200 OK", "application/json", body)]).await;
        let client = client_for(&url);

        let embeddings = client
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /embeddings "));
        assert!(request.contains("text-embedding-ada-002"));
    }

    #[test]
    fn test_chat_request_shape() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "gpt-3.5-turbo-0125",
            messages: &messages,
            stream: true,
            temperature: 0.7,
            max_tokens: None,
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["stream"], true);
        assert!(json.get("max_tokens").is_none());
    }
}
