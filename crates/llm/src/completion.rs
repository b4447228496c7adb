//! Fail-soft completion calls used by the report pipeline.
//!
//! Prose generation never aborts a report: a failed call turns into an
//! inline error marker that downstream stages carry as opaque text.
//! Structured generation degrades to an empty JSON object.

use crate::client::{LlmClient, LlmRequest};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Prefix of the marker substituted for a failed text completion.
pub const ERROR_MARKER_PREFIX: &str = "[Error: LLM call failed.";

/// Completion front-end bound to one client and model.
#[derive(Clone)]
pub struct Completer {
    client: Arc<dyn LlmClient>,
    model: String,
    planner_temperature: f32,
}

impl Completer {
    /// Create a completer. `planner_temperature` is used for JSON calls.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, planner_temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            planner_temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Free-text completion. Returns the error marker instead of failing.
    pub async fn text_completion(&self, prompt: &str, temperature: f32) -> String {
        let request = LlmRequest::new(prompt, self.model.as_str()).with_temperature(temperature);

        match self.client.complete(&request).await {
            Ok(response) => response.content,
            Err(e) => {
                tracing::warn!(error = %e, provider = self.client.provider_name(), "Text completion failed");
                format!("{} {}]", ERROR_MARKER_PREFIX, e)
            }
        }
    }

    /// Structured completion. Anything other than a JSON object becomes `{}`.
    pub async fn json_completion(&self, prompt: &str) -> Value {
        let request = LlmRequest::new(prompt, self.model.as_str())
            .with_temperature(self.planner_temperature)
            .with_json_output();

        let raw = match self.client.complete(&request).await {
            Ok(response) => response.content,
            Err(e) => {
                tracing::warn!(error = %e, "JSON completion failed");
                return empty_object();
            }
        };

        match serde_json::from_str::<Value>(strip_code_fence(&raw)) {
            Ok(value @ Value::Object(_)) => value,
            Ok(other) => {
                tracing::warn!(kind = json_kind(&other), "JSON completion was not an object");
                empty_object()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse JSON completion");
                empty_object()
            }
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = body.strip_suffix("```") else {
        return trimmed;
    };
    // Skip the info string (e.g. "json") on the opening line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LlmResponse, LlmUsage};
    use dossier_core::{AppError, AppResult};
    use std::sync::Mutex;

    struct CannedClient {
        reply: AppResult<String>,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl CannedClient {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(AppError::Llm("connection refused".to_string())),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for CannedClient {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::default(),
                }),
                Err(e) => Err(AppError::Llm(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_text_completion_passes_temperature() {
        let client = CannedClient::ok("Some prose.");
        let completer = Completer::new(client.clone(), "test-model", 0.2);

        let text = completer.text_completion("Write", 0.4).await;
        assert_eq!(text, "Some prose.");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, Some(0.4));
        assert_eq!(seen[0].model, "test-model");
        assert!(!seen[0].json);
    }

    #[tokio::test]
    async fn test_text_completion_failure_yields_marker() {
        let completer = Completer::new(CannedClient::failing(), "m", 0.2);
        let text = completer.text_completion("Write", 0.4).await;
        assert!(text.starts_with(ERROR_MARKER_PREFIX));
        assert!(text.contains("connection refused"));
        assert!(text.ends_with(']'));
    }

    #[tokio::test]
    async fn test_json_completion_parses_object() {
        let client = CannedClient::ok(r#"{"sections": [{"title": "Intro", "description": "d"}]}"#);
        let completer = Completer::new(client.clone(), "m", 0.2);

        let value = completer.json_completion("Plan").await;
        assert_eq!(value["sections"][0]["title"], "Intro");

        let seen = client.seen.lock().unwrap();
        assert!(seen[0].json);
        assert_eq!(seen[0].temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_json_completion_strips_fence() {
        let completer = Completer::new(CannedClient::ok("```json\n{\"a\": 1}\n```"), "m", 0.2);
        assert_eq!(completer.json_completion("x").await["a"], 1);
    }

    #[tokio::test]
    async fn test_json_completion_degrades_to_empty_object() {
        for reply in ["not json at all", "[1, 2, 3]", "\"text\""] {
            let completer = Completer::new(CannedClient::ok(reply), "m", 0.2);
            assert_eq!(completer.json_completion("x").await, serde_json::json!({}));
        }

        let completer = Completer::new(CannedClient::failing(), "m", 0.2);
        assert_eq!(completer.json_completion("x").await, serde_json::json!({}));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```{}```"), "{}");
        assert_eq!(strip_code_fence("```json\n{}"), "```json\n{}");
    }
}
