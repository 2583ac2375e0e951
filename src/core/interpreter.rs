use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::core::tokenizer::extract_keywords;
use crate::models::{JobLevel, StructuredIntent, GENERAL_INTENT};
use crate::services::llm::{recover_object, LlmClient, UpstreamError};

const INTERPRET_SYSTEM: &str = "You analyze job search queries. \
Reply with a single-line JSON object and nothing else.";

/// How a single `interpret` call treats the external service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpretOptions {
    /// Give up on the external service after this long; wait forever when `None`
    pub deadline: Option<Duration>,
    /// On fallback, copy the extracted keywords into `search_terms`
    pub seed_search_terms: bool,
}

impl InterpretOptions {
    /// No deadline, as used when interpreting a phrase on its own
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Deadline-bound interpretation for live search, seeding search terms on
    /// fallback so predicate building still gets multi-term input
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            seed_search_terms: true,
        }
    }
}

/// Turns free search text into a [`StructuredIntent`].
///
/// Always returns a usable intent: any upstream problem degrades to keyword
/// extraction.
#[derive(Debug, Clone, Default)]
pub struct QueryInterpreter {
    client: Option<Arc<LlmClient>>,
}

impl QueryInterpreter {
    pub fn new(client: Option<Arc<LlmClient>>) -> Self {
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub async fn interpret(&self, search_text: &str, options: InterpretOptions) -> StructuredIntent {
        if search_text.trim().is_empty() {
            return StructuredIntent::neutral(search_text);
        }

        let Some(client) = self.client.as_deref() else {
            return fallback_intent(search_text, &UpstreamError::Unavailable, false);
        };

        let request = request_intent(client, search_text);
        let outcome = match options.deadline {
            // A late response is dropped together with the request future.
            Some(deadline) => match tokio::time::timeout(deadline, request).await {
                Ok(result) => result,
                Err(_) => Err(UpstreamError::Timeout(deadline)),
            },
            None => request.await,
        };

        match outcome {
            Ok(object) => intent_from_object(&object, search_text),
            Err(e) => {
                tracing::warn!("Query interpretation failed, using keyword fallback: {}", e);
                fallback_intent(search_text, &e, options.seed_search_terms)
            }
        }
    }
}

async fn request_intent(client: &LlmClient, search_text: &str) -> Result<Map<String, Value>, UpstreamError> {
    let content = client.complete(INTERPRET_SYSTEM, &interpret_prompt(search_text)).await?;

    recover_object(&content).ok_or_else(|| {
        UpstreamError::InvalidResponse(format!(
            "no JSON object in response: {}",
            content.chars().take(120).collect::<String>()
        ))
    })
}

fn interpret_prompt(search_text: &str) -> String {
    // Quote through serde so the raw text cannot break out of the instruction.
    let quoted = Value::String(search_text.to_string()).to_string();
    format!(
        "Extract the job search intent from the query {quoted}. \
Respond with one line of JSON with exactly these keys: \
\"keywords\" (array of strings), \"skills\" (array of strings), \
\"jobTitle\" (string or null), \"jobLevel\" (\"entry\", \"mid\", \"senior\", \"executive\" or null), \
\"intent\" (short label), \"improvedQuery\" (rewritten query), \"searchTerms\" (array of strings)."
    )
}

/// Deterministic intent used whenever the external service is not used
pub fn fallback_intent(search_text: &str, reason: &UpstreamError, seed_search_terms: bool) -> StructuredIntent {
    let keywords = extract_keywords(search_text);
    let search_terms = if seed_search_terms { keywords.clone() } else { vec![] };

    StructuredIntent {
        keywords,
        search_terms,
        fallback_reason: Some(reason.to_string()),
        ..StructuredIntent::neutral(search_text)
    }
}

/// Populate an intent from the service's JSON, defaulting missing keys
fn intent_from_object(object: &Map<String, Value>, search_text: &str) -> StructuredIntent {
    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    StructuredIntent {
        keywords: string_list(object.get("keywords")),
        skills: string_list(object.get("skills")),
        job_title: text("jobTitle"),
        job_level: text("jobLevel").as_deref().and_then(JobLevel::parse),
        intent: text("intent").unwrap_or_else(|| GENERAL_INTENT.to_string()),
        improved_query: text("improvedQuery").unwrap_or_else(|| search_text.to_string()),
        search_terms: string_list(object.get("searchTerms")),
        used_external_service: true,
        fallback_reason: None,
    }
}

/// Accepts an array of strings or a single string; anything else is empty
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(single)) => vec![single.as_str()],
        _ => vec![],
    };

    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
