use crate::constants::app;
use crate::error::{MindError, Result};
use crate::llm::provider::ProviderId;
use crate::llm::traits::*;
use serde::Deserialize;
use serde_json::Value;

/// Adapter for every provider speaking the OpenAI chat-completions dialect:
/// the OpenRouter gateway, DeepSeek and ChatGPT.
pub struct OpenAiCompatAdapter {
    id: ProviderId,
    api_key: String,
    model: String,
    base_url: String,
    extra_headers: Vec<(String, String)>,
}

impl OpenAiCompatAdapter {
    pub fn new(id: ProviderId, api_key: impl Into<String>) -> Self {
        Self {
            id,
            api_key: api_key.into(),
            model: id.default_model().to_string(),
            base_url: id.default_base_url().to_string(),
            extra_headers: Vec::new(),
        }
    }

    /// The unified gateway, which wants to know who is calling.
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new(ProviderId::OpenRouter, api_key)
            .with_header("HTTP-Referer", app::SITE_URL)
            .with_header("X-Title", app::APP_NAME)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

impl ProviderAdapter for OpenAiCompatAdapter {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self, _model: &str) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )];
        headers.extend(self.extra_headers.iter().cloned());
        headers
    }

    fn build_wire_request(&self, payload: &RequestPayload) -> Result<WireRequest> {
        let body = serde_json::to_value(payload)?;
        Ok(WireRequest {
            url: self.endpoint_url(&payload.model),
            headers: self.auth_headers(),
            body,
        })
    }

    fn extract_text(&self, body: &Value) -> Result<String> {
        let response: OpenAIResponse = serde_json::from_value(body.clone())
            .map_err(|_| MindError::malformed(self.id.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MindError::malformed(self.id.to_string()))?;

        choice
            .message
            .content
            .ok_or_else(|| MindError::malformed(self.id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> RequestPayload {
        RequestPayload {
            model: "deepseek-chat".into(),
            messages: vec![ChatMessage::from(&crate::llm::Message::user("hello"))],
            temperature: None,
            max_tokens: None,
        }
    }

    #[test]
    fn gateway_request_carries_identity_headers() {
        let adapter = OpenAiCompatAdapter::openrouter("sk-test");
        let request = adapter.build_wire_request(&payload()).unwrap();

        assert_eq!(request.url, "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
        assert_eq!(request.header("HTTP-Referer"), Some("https://mind-ai.local"));
        assert_eq!(request.header("X-Title"), Some("Mind AI Study Helper"));
        assert_eq!(request.body["messages"][0]["content"], "hello");
        assert!(request.body.get("temperature").is_none());
    }

    #[test]
    fn direct_provider_uses_its_base_url() {
        let adapter =
            OpenAiCompatAdapter::new(ProviderId::DeepSeek, "k").with_base_url("http://localhost:9/");
        let request = adapter.build_wire_request(&payload()).unwrap();
        assert_eq!(request.url, "http://localhost:9/v1/chat/completions");
        assert!(request.header("X-Title").is_none());
    }

    #[test]
    fn extracts_first_choice() {
        let adapter = OpenAiCompatAdapter::new(ProviderId::ChatGpt, "k");
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "42"}}]});
        assert_eq!(adapter.extract_text(&body).unwrap(), "42");
    }

    #[test]
    fn empty_choices_are_malformed() {
        let adapter = OpenAiCompatAdapter::new(ProviderId::ChatGpt, "k");
        let err = adapter.extract_text(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, MindError::MalformedResponse { provider } if provider == "chatgpt"));
    }

    #[test]
    fn error_object_wins_over_status() {
        let adapter = OpenAiCompatAdapter::openrouter("k");
        let response = WireResponse::ok(r#"{"error": {"message": "Invalid API key", "code": 401}}"#);
        let err = adapter.interpret_response(&response).unwrap_err();
        assert!(matches!(
            err,
            MindError::Provider { provider, message }
                if provider == "openrouter" && message == "Invalid API key"
        ));
    }

    #[test]
    fn non_success_status_without_error_object() {
        let adapter = OpenAiCompatAdapter::openrouter("k");
        let response = WireResponse {
            status: 502,
            body: "Bad Gateway".into(),
        };
        let err = adapter.interpret_response(&response).unwrap_err();
        assert!(matches!(err, MindError::Provider { message, .. } if message == "HTTP 502: Bad Gateway"));
    }

    #[test]
    fn non_json_success_is_malformed() {
        let adapter = OpenAiCompatAdapter::openrouter("k");
        let err = adapter
            .interpret_response(&WireResponse::ok("<html>"))
            .unwrap_err();
        assert!(matches!(err, MindError::MalformedResponse { .. }));
    }
}
