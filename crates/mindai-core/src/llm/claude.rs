use crate::attachment::split_data_url;
use crate::constants::{chat, endpoints};
use crate::error::{MindError, Result};
use crate::llm::provider::ProviderId;
use crate::llm::traits::*;
use serde::Deserialize;
use serde_json::Value;

pub struct ClaudeAdapter {
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: ProviderId::Claude.default_model().to_string(),
            base_url: endpoints::CLAUDE_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn convert_content(content: &MessageContent) -> Value {
        match content {
            MessageContent::Text(text) => Value::String(text.clone()),
            MessageContent::Parts(parts) => {
                let blocks: Vec<Value> = parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => serde_json::json!({
                            "type": "text",
                            "text": text,
                        }),
                        ContentPart::ImageUrl { image_url } => match split_data_url(&image_url.url) {
                            Some((media_type, data)) => serde_json::json!({
                                "type": "image",
                                "source": {
                                    "type": "base64",
                                    "media_type": media_type,
                                    "data": data,
                                }
                            }),
                            None => serde_json::json!({
                                "type": "image",
                                "source": {"type": "url", "url": image_url.url}
                            }),
                        },
                    })
                    .collect();
                Value::Array(blocks)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

impl ProviderAdapter for ClaudeAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self, _model: &str) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            ("x-api-key".to_string(), self.api_key.clone()),
            (
                "anthropic-version".to_string(),
                endpoints::ANTHROPIC_VERSION.to_string(),
            ),
        ]
    }

    fn build_wire_request(&self, payload: &RequestPayload) -> Result<WireRequest> {
        let conv_messages: Vec<Value> = payload
            .conversation()
            .map(|m| {
                serde_json::json!({
                    "role": m.role,
                    "content": Self::convert_content(&m.content),
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": payload.model,
            "max_tokens": payload.max_tokens.unwrap_or(chat::CLAUDE_FALLBACK_MAX_TOKENS),
            "messages": conv_messages,
        });

        if let Some(system_prompt) = payload.system_prompt() {
            body["system"] = Value::String(system_prompt);
        }
        if let Some(temperature) = payload.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        Ok(WireRequest {
            url: self.endpoint_url(&payload.model),
            headers: self.auth_headers(),
            body,
        })
    }

    fn extract_text(&self, body: &Value) -> Result<String> {
        let response: ClaudeApiResponse = serde_json::from_value(body.clone())
            .map_err(|_| MindError::malformed("claude"))?;

        let texts: Vec<String> = response
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text)
            .collect();

        if texts.is_empty() {
            return Err(MindError::malformed("claude"));
        }
        Ok(texts.join(""))
    }
}
