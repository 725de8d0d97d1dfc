use crate::attachment::Attachment;
use crate::error::{MindError, Result};
use crate::llm::provider::ProviderId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A stored conversation message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachments: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            attachments: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// One typed part of a multi-part message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// All text parts joined with newlines.
    pub fn joined_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A message in the outgoing, gateway-shaped request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: MessageContent::Text(message.content.clone()),
        }
    }
}

/// Unified request, serialized verbatim for OpenAI-compatible providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestPayload {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl RequestPayload {
    /// System messages joined into one prompt.
    pub fn system_prompt(&self) -> Option<String> {
        let joined = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.joined_text())
            .collect::<Vec<_>>()
            .join("\n\n");
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }

    pub fn conversation(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }

    /// Text of the newest user message.
    pub fn prompt(&self) -> String {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.joined_text())
            .unwrap_or_default()
    }
}

/// A fully built HTTP request for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl WireRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

impl WireResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Translates the unified request into one provider's wire format and back.
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Model used when the caller has no preference.
    fn model(&self) -> &str;

    fn endpoint_url(&self, model: &str) -> String;

    fn auth_headers(&self) -> Vec<(String, String)>;

    fn build_wire_request(&self, payload: &RequestPayload) -> Result<WireRequest>;

    /// Pull the assistant text out of a successful response body.
    fn extract_text(&self, body: &Value) -> Result<String>;

    /// Validate status and error objects, then extract the text.
    fn interpret_response(&self, response: &WireResponse) -> Result<String> {
        let provider = self.id().to_string();
        let parsed: Option<Value> = serde_json::from_str(&response.body).ok();

        if let Some(message) = parsed.as_ref().and_then(provider_error_message) {
            return Err(MindError::provider(provider, message));
        }

        if !response.is_success() {
            let body = response.body.trim();
            let message = if body.is_empty() {
                format!("HTTP {}", response.status)
            } else {
                format!("HTTP {}: {}", response.status, body)
            };
            return Err(MindError::provider(provider, message));
        }

        match parsed {
            Some(body) => self.extract_text(&body),
            None => Err(MindError::malformed(provider)),
        }
    }
}

/// The `error` object every supported provider uses for failures.
pub fn provider_error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    if error.is_null() {
        return None;
    }
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .or_else(|| error.as_str().map(str::to_string))
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_serializes_in_gateway_shape() {
        let payload = RequestPayload {
            model: "m".into(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: MessageContent::Text("sys".into()),
                },
                ChatMessage {
                    role: Role::User,
                    content: MessageContent::Parts(vec![
                        ContentPart::text("what is this?"),
                        ContentPart::image("data:image/png;base64,AA"),
                    ]),
                },
            ],
            temperature: Some(0.3),
            max_tokens: Some(4000),
        };

        let value = serde_json::to_value(&payload).unwrap();
        let temperature = value["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
        assert_eq!(value["max_tokens"], 4000);
        assert_eq!(
            value["messages"],
            json!([
                {"role": "system", "content": "sys"},
                {"role": "user", "content": [
                    {"type": "text", "text": "what is this?"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AA"}}
                ]}
            ])
        );
    }

    #[test]
    fn stored_message_omits_missing_attachments() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn prompt_is_last_user_text() {
        let payload = RequestPayload {
            model: "m".into(),
            messages: vec![
                ChatMessage::from(&Message::user("first")),
                ChatMessage::from(&Message::assistant("reply")),
                ChatMessage {
                    role: Role::User,
                    content: MessageContent::Parts(vec![
                        ContentPart::text("second"),
                        ContentPart::image("data:image/png;base64,AA"),
                    ]),
                },
            ],
            temperature: None,
            max_tokens: None,
        };
        assert_eq!(payload.prompt(), "second");
        assert!(payload.system_prompt().is_none());
    }

    #[test]
    fn provider_error_message_variants() {
        assert_eq!(
            provider_error_message(&json!({"error": {"message": "bad key"}})),
            Some("bad key".into())
        );
        assert_eq!(
            provider_error_message(&json!({"error": "quota"})),
            Some("quota".into())
        );
        assert_eq!(provider_error_message(&json!({"error": null})), None);
        assert_eq!(provider_error_message(&json!({"choices": []})), None);
    }
}
