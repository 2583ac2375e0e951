use regex::Regex;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmSettings;

/// Failures talking to the external text-understanding service.
///
/// None of these are fatal: every caller has a deterministic fallback.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("external service is not configured")]
    Unavailable,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Status(u16),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// OpenAI-compatible chat completion client.
///
/// Built once at start-up and shared behind an `Arc`; holds no mutable state.
#[derive(Clone)]
pub struct LlmClient {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Create a new client. No request timeout is applied when `request_timeout`
    /// is `None`.
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        temperature: f32,
        request_timeout: Option<Duration>,
    ) -> Result<Self, UpstreamError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            endpoint,
            api_key,
            model,
            temperature,
            client: builder.build()?,
        })
    }

    /// Build a client from settings.
    ///
    /// Returns `None` when no API key is configured, which callers treat as the
    /// service being unavailable.
    pub fn from_settings(settings: &LlmSettings) -> Option<Result<Self, UpstreamError>> {
        let api_key = settings.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;

        Some(Self::new(
            settings.endpoint.clone(),
            api_key.to_string(),
            settings.model.clone(),
            settings.temperature,
            settings.request_timeout_secs.map(Duration::from_secs),
        ))
    }

    /// Send one system + user message pair and return the assistant text
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        tracing::debug!("Sending completion request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let json: Value = response.json().await?;

        json.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or_else(|| UpstreamError::InvalidResponse("Missing choices[0].message.content".into()))
    }
}

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").unwrap());

/// Parse a JSON object out of model output.
///
/// Tries the whole text, then each fenced code block, then the first balanced
/// `{...}` span.
pub fn recover_object(content: &str) -> Option<Map<String, Value>> {
    match recover_value(content, '{', '}')? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Parse a JSON array out of model output, with the same recovery steps as
/// [`recover_object`].
pub fn recover_array(content: &str) -> Option<Vec<Value>> {
    match recover_value(content, '[', ']')? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn recover_value(content: &str, open: char, close: char) -> Option<Value> {
    let wanted = |value: &Value| match open {
        '{' => value.is_object(),
        _ => value.is_array(),
    };

    if let Ok(value) = serde_json::from_str::<Value>(content.trim()) {
        if wanted(&value) {
            return Some(value);
        }
    }

    for capture in FENCED_BLOCK.captures_iter(content) {
        if let Ok(value) = serde_json::from_str::<Value>(capture[1].trim()) {
            if wanted(&value) {
                return Some(value);
            }
        }
        tracing::debug!("Fenced block did not contain the expected JSON");
    }

    let span = first_balanced_span(content, open, close)?;
    match serde_json::from_str::<Value>(span) {
        Ok(value) if wanted(&value) => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Embedded JSON span failed to parse: {}", e);
            None
        }
    }
}

/// Slice from the first `open` to its matching `close`, skipping delimiters
/// inside string literals.
fn first_balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recover_plain_object() {
        let map = recover_object(r#"{"keywords": ["rust"]}"#).unwrap();
        assert_eq!(map["keywords"][0], "rust");
    }

    #[test]
    fn test_recover_fenced_matches_unwrapped() {
        let raw = r#"{"keywords":["rust","tokio"],"jobLevel":"senior"}"#;
        let fenced = format!("Here you go:\n```json\n{}\n```\nGood luck!", raw);

        assert_eq!(recover_object(&fenced), recover_object(raw));
        assert!(recover_object(&fenced).is_some());
    }

    #[test]
    fn test_recover_fenced_without_language() {
        let fenced = "```\n[\"a\", \"b\"]\n```";
        let items = recover_array(fenced).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_recover_embedded_span() {
        let text = r#"Sure! {"intent": "find {remote} work", "skills": []} hope this helps"#;
        let map = recover_object(text).unwrap();
        assert_eq!(map["intent"], "find {remote} work");
    }

    #[test]
    fn test_recover_rejects_garbage() {
        assert!(recover_object("no json here").is_none());
        assert!(recover_object("{not: valid}").is_none());
        assert!(recover_object("[1, 2]").is_none());
        assert!(recover_array(r#"{"a": 1}"#).is_none());
    }

    #[test]
    fn test_balanced_span_unclosed() {
        assert_eq!(first_balanced_span("{\"a\": {", '{', '}'), None);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = LlmClient::new(
            "https://llm.test/v1".into(),
            "sk-very-secret".into(),
            "test-model".into(),
            0.0,
            None,
        )
        .unwrap();
        let printed = format!("{:?}", client);

        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("test-model"));
    }

    #[test]
    fn test_from_settings_without_key() {
        let settings = LlmSettings {
            api_key: Some("  ".to_string()),
            ..LlmSettings::default()
        };
        assert!(LlmClient::from_settings(&settings).is_none());
    }

    #[tokio::test]
    async fn test_complete_reads_message_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"[\"job-1\"]"}}]}"#)
            .create_async()
            .await;

        let client = LlmClient::new(server.url(), "secret".into(), "test-model".into(), 0.0, None).unwrap();
        let content = client.complete("system", "prompt").await.unwrap();

        assert_eq!(content, r#"["job-1"]"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_maps_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .create_async()
            .await;

        let client = LlmClient::new(server.url(), "secret".into(), "test-model".into(), 0.0, None).unwrap();
        let err = client.complete("system", "prompt").await.unwrap_err();

        assert!(matches!(err, UpstreamError::Status(503)));
    }
}
