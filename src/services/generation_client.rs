use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::request_builder::GenerationRequest;
use crate::{
    config::PlannerConfig,
    error::{PlannerError, Result},
};

/// Anything that can turn a generation request into raw response text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
///
/// One attempt per call; the whole exchange is bounded by the configured timeout.
#[derive(Clone, Debug)]
pub struct GenerationClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
    max_tokens: Option<u32>,
}

impl GenerationClient {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
            max_tokens: config.max_tokens,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PlannerError::Configuration(
                    "no API key is configured for the generation service".to_string(),
                )
            })
    }

    async fn send(&self, api_key: &str, body: &Value) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| PlannerError::Service(format!("failed to build HTTP client: {err}")))?;

        let request_url = build_chat_url(&self.base_url);
        debug!(target: "tripplanner::client", url = %request_url, model = %self.model, "sending generation request");

        let response = client
            .post(&request_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "trip-planner-rs")
            .json(body)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;

        let response_json: Option<Value> = serde_json::from_str(&response_text).ok();

        if !status.is_success() {
            let api_message = response_json
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| response_text.clone());
            warn!(target: "tripplanner::client", %status, message = %api_message, "generation service returned an error");

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(PlannerError::QuotaExceeded(api_message));
            }
            return Err(classify_failure(
                &format!("HTTP {} error: {}", status, api_message),
                self.timeout,
            ));
        }

        let response_json = response_json.ok_or_else(|| {
            PlannerError::Service("generation service returned a non-JSON envelope".to_string())
        })?;

        if let Some(message) = error_message(&response_json) {
            warn!(target: "tripplanner::client", message = %message, "generation service reported an error");
            return Err(classify_failure(&message, self.timeout));
        }

        extract_content(&response_json)
    }

    fn transport_error(&self, err: reqwest::Error) -> PlannerError {
        if err.is_timeout() {
            PlannerError::Timeout(self.timeout.as_secs())
        } else {
            classify_failure(&format!("HTTP request failed: {err}"), self.timeout)
        }
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let api_key = self.api_key()?;

        let body = ChatCompletionRequest::new(
            self.model.clone(),
            vec![
                json!({ "role": "system", "content": request.system_instruction }),
                json!({ "role": "user", "content": request.prompt }),
            ],
        )
        .with_max_tokens(self.max_tokens)
        .with_response_format(request.schema.response_format())
        .into_value();

        match tokio::time::timeout(self.timeout, self.send(api_key, &body)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(target: "tripplanner::client", timeout_secs = self.timeout.as_secs(), "generation request timed out");
                Err(PlannerError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

/// Map a service error message onto the failure taxonomy by keyword.
pub(crate) fn classify_failure(message: &str, timeout: Duration) -> PlannerError {
    let lowered = message.to_lowercase();
    if lowered.contains("quota")
        || lowered.contains("rate limit")
        || lowered.contains("resource_exhausted")
    {
        PlannerError::QuotaExceeded(message.to_string())
    } else if lowered.contains("safety")
        || lowered.contains("content_filter")
        || lowered.contains("blocked")
    {
        PlannerError::ContentBlocked(message.to_string())
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        PlannerError::Timeout(timeout.as_secs())
    } else {
        PlannerError::Service(message.to_string())
    }
}

fn error_message(response: &Value) -> Option<String> {
    let error = response.get("error")?;
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

fn extract_content(response: &Value) -> Result<String> {
    let first_choice = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| {
            PlannerError::Service("completion response contained no choices".to_string())
        })?;

    if first_choice.get("finish_reason").and_then(Value::as_str) == Some("content_filter") {
        return Err(PlannerError::ContentBlocked(
            "completion stopped by the content filter".to_string(),
        ));
    }

    first_choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            PlannerError::Service("completion response contained no text content".to_string())
        })
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    max_tokens: Option<u32>,
    response_format: Option<Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_response_format(mut self, response_format: Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(response_format) = self.response_format {
            body["response_format"] = response_format;
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://openrouter.ai/api/v1/"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost:1234/chat/completions"),
            "http://localhost:1234/chat/completions"
        );
    }

    #[test]
    fn test_classify_failure() {
        let timeout = Duration::from_secs(30);
        assert_eq!(
            classify_failure("You exceeded your current quota", timeout).error_code(),
            "QUOTA_EXCEEDED"
        );
        assert_eq!(
            classify_failure("Candidate blocked: SAFETY", timeout).error_code(),
            "CONTENT_BLOCKED"
        );
        assert_eq!(
            classify_failure("upstream timeout", timeout),
            PlannerError::Timeout(30)
        );
        assert_eq!(
            classify_failure("bad gateway", timeout).error_code(),
            "SERVICE_ERROR"
        );
    }

    #[test]
    fn test_extract_content() {
        let ok = json!({ "choices": [{ "message": { "content": "{\"a\":1}" }, "finish_reason": "stop" }] });
        assert_eq!(extract_content(&ok).unwrap(), "{\"a\":1}");

        let filtered = json!({ "choices": [{ "message": { "content": null }, "finish_reason": "content_filter" }] });
        assert_eq!(extract_content(&filtered).unwrap_err().error_code(), "CONTENT_BLOCKED");

        let empty = json!({ "choices": [] });
        assert_eq!(extract_content(&empty).unwrap_err().error_code(), "SERVICE_ERROR");
    }

    #[test]
    fn test_request_body_includes_response_format() {
        let body = ChatCompletionRequest::new("model-x", vec![json!({"role": "user", "content": "hi"})])
            .with_max_tokens(Some(512))
            .with_response_format(json!({ "type": "json_object" }))
            .into_value();
        assert_eq!(body["model"], "model-x");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["response_format"]["type"], "json_object");
    }
}
