//! Client for pulling prompt templates from the remote prompt registry

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::PromptConfig;
use crate::error::{Error, Result};
use crate::types::Role;

use super::prompt::{ChatPromptTemplate, PromptTemplate};

/// Registry client (LangSmith hub protocol)
pub struct PromptHub {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct CommitResponse {
    manifest: Value,
}

impl PromptHub {
    /// Create a new registry client
    pub fn new(config: &PromptConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch a template by handle: `owner/name`, optionally `:commit`
    pub async fn pull(&self, handle: &str) -> Result<ChatPromptTemplate> {
        let (owner, name, commit) = parse_handle(handle)?;
        let url = format!("{}/commits/{}/{}/{}", self.api_url, owner, name, commit);

        tracing::info!("Pulling prompt {} from {}", handle, self.api_url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::prompt(format!("Prompt request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::prompt(format!(
                "Pulling '{}' failed: HTTP {} - {}",
                handle, status, body
            )));
        }

        let commit: CommitResponse = response.json().await?;
        parse_manifest(&commit.manifest)
    }
}

fn parse_handle(handle: &str) -> Result<(&str, &str, &str)> {
    let (path, commit) = handle.split_once(':').unwrap_or((handle, "latest"));
    let (owner, name) = path.split_once('/').unwrap_or(("-", path));

    if name.is_empty() || owner.is_empty() || commit.is_empty() {
        return Err(Error::prompt(format!("Invalid prompt handle '{}'", handle)));
    }
    Ok((owner, name, commit))
}

/// Last element of a serialized object's `id` path, e.g. `ChatPromptTemplate`
fn class_name(node: &Value) -> Option<&str> {
    node.get("id")?.as_array()?.last()?.as_str()
}

fn kwargs<'a>(node: &'a Value, class: &str) -> Result<&'a Value> {
    node.get("kwargs")
        .ok_or_else(|| Error::prompt(format!("{} without kwargs", class)))
}

/// Convert a serialized prompt object into a chat template
///
/// Accepts a `ChatPromptTemplate` of message templates or a bare
/// `PromptTemplate` (treated as a single user message).
pub fn parse_manifest(manifest: &Value) -> Result<ChatPromptTemplate> {
    let class = class_name(manifest)
        .ok_or_else(|| Error::prompt("Manifest is not a serialized prompt"))?;

    match class {
        "ChatPromptTemplate" => {
            let messages = kwargs(manifest, class)?
                .get("messages")
                .and_then(Value::as_array)
                .ok_or_else(|| Error::prompt("ChatPromptTemplate without messages"))?;

            let messages = messages
                .iter()
                .map(parse_message)
                .collect::<Result<Vec<_>>>()?;
            Ok(ChatPromptTemplate::new(messages))
        }
        "PromptTemplate" => Ok(ChatPromptTemplate::new(vec![(
            Role::User,
            parse_template(manifest)?,
        )])),
        other => Err(Error::prompt(format!("Unsupported prompt type '{}'", other))),
    }
}

fn parse_message(node: &Value) -> Result<(Role, PromptTemplate)> {
    let class = class_name(node).unwrap_or_default();
    let args = kwargs(node, class)?;

    let role = match class {
        "SystemMessagePromptTemplate" => Role::System,
        "HumanMessagePromptTemplate" => Role::User,
        "AIMessagePromptTemplate" => Role::Assistant,
        "ChatMessagePromptTemplate" => match args.get("role").and_then(Value::as_str) {
            Some("system") => Role::System,
            Some("assistant") | Some("ai") => Role::Assistant,
            _ => Role::User,
        },
        other => {
            return Err(Error::prompt(format!("Unsupported message template '{}'", other)));
        }
    };

    let prompt = args
        .get("prompt")
        .ok_or_else(|| Error::prompt(format!("{} without prompt", class)))?;
    Ok((role, parse_template(prompt)?))
}

fn parse_template(node: &Value) -> Result<PromptTemplate> {
    let args = kwargs(node, "PromptTemplate")?;

    let format = args
        .get("template_format")
        .and_then(Value::as_str)
        .unwrap_or("f-string");
    if format != "f-string" {
        return Err(Error::prompt(format!("Unsupported template format '{}'", format)));
    }

    let template = args
        .get("template")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::prompt("PromptTemplate without template"))?;
    PromptTemplate::parse(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fake::{http_response, serve_once};
    use serde_json::json;

    fn lc(class: &str, kwargs: Value) -> Value {
        json!({
            "lc": 1,
            "type": "constructor",
            "id": ["langchain", "prompts", "chat", class],
            "kwargs": kwargs,
        })
    }

    fn rag_manifest() -> Value {
        let template = lc(
            "PromptTemplate",
            json!({
                "input_variables": ["context", "question"],
                "template": "Answer briefly.\nQuestion: {question} \nContext: {context} \nAnswer:",
                "template_format": "f-string",
            }),
        );
        lc(
            "ChatPromptTemplate",
            json!({
                "input_variables": ["context", "question"],
                "messages": [lc("HumanMessagePromptTemplate", json!({ "prompt": template }))],
            }),
        )
    }

    #[test]
    fn test_parse_chat_manifest() {
        let prompt = parse_manifest(&rag_manifest()).unwrap();

        assert_eq!(prompt.len(), 1);
        assert_eq!(prompt.input_variables(), vec!["question", "context"]);

        let messages = prompt
            .format_messages(&[("question", "Q"), ("context", "C")])
            .unwrap();
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Answer briefly.\nQuestion: Q \nContext: C \nAnswer:");
    }

    #[test]
    fn test_parse_system_and_bare_templates() {
        let system = lc(
            "SystemMessagePromptTemplate",
            json!({ "prompt": lc("PromptTemplate", json!({ "template": "Be terse." })) }),
        );
        let chat = lc("ChatPromptTemplate", json!({ "messages": [system] }));
        let prompt = parse_manifest(&chat).unwrap();
        assert_eq!(prompt.format_messages(&[]).unwrap()[0].role, Role::System);

        let bare = lc("PromptTemplate", json!({ "template": "{question}" }));
        assert_eq!(parse_manifest(&bare).unwrap().input_variables(), vec!["question"]);
    }

    #[test]
    fn test_mustache_templates_rejected() {
        let bare = lc(
            "PromptTemplate",
            json!({ "template": "{{question}}", "template_format": "mustache" }),
        );
        assert!(parse_manifest(&bare).is_err());
    }

    #[test]
    fn test_parse_handle() {
        assert_eq!(parse_handle("rlm/rag-prompt").unwrap(), ("rlm", "rag-prompt", "latest"));
        assert_eq!(
            parse_handle("rlm/rag-prompt:50442af1").unwrap(),
            ("rlm", "rag-prompt", "50442af1")
        );
        assert_eq!(parse_handle("my-prompt").unwrap(), ("-", "my-prompt", "latest"));
        assert!(parse_handle("rlm/").is_err());
    }

    #[tokio::test]
    async fn test_pull_requests_latest_commit() {
        let body = json!({ "commit_hash": "50442af1", "manifest": rag_manifest() }).to_string();
        let (url, server) =
            serve_once(vec![http_response("200 OK", "application/json", &body)]).await;
        let config = PromptConfig {
            api_url: format!("{}/", url),
            api_key: Some("ls-key".to_string()),
            ..Default::default()
        };

        let prompt = PromptHub::new(&config).unwrap().pull("rlm/rag-prompt").await.unwrap();

        assert_eq!(prompt.input_variables(), vec!["question", "context"]);
        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /commits/rlm/rag-prompt/latest "));
        assert!(request.contains("x-api-key: ls-key"));
    }

    #[tokio::test]
    async fn test_pull_missing_prompt_is_error() {
        let (url, _server) = serve_once(vec![http_response(
            "404 Not Found",
            "application/json",
            r#"{"detail":"Not found"}"#,
        )])
        .await;
        let config = PromptConfig {
            api_url: url,
            ..Default::default()
        };

        let result = PromptHub::new(&config).unwrap().pull("rlm/missing").await;

        assert!(matches!(result, Err(Error::Prompt(msg)) if msg.contains("404")));
    }
}
