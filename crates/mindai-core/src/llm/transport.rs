use crate::constants::chat;
use crate::error::{MindError, Result};
use crate::llm::traits::{ProviderAdapter, RequestPayload, WireRequest, WireResponse};
use std::time::Duration;

#[derive(Debug)]
pub enum TransportError {
    Timeout(Duration),
    Http(reqwest::Error),
}

/// Performs the single HTTP round trip of a turn.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, request: &WireRequest) -> std::result::Result<WireResponse, TransportError>;
}

/// reqwest-backed transport with a hard request timeout.
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(chat::REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: &WireRequest) -> std::result::Result<WireResponse, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(self.timeout)
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Http(e)
            }
        };

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_err)?;

        Ok(WireResponse { status, body })
    }
}

/// Send `payload` through `adapter` and return the assistant text.
///
/// No retries: a failed call surfaces immediately.
pub async fn dispatch(
    adapter: &dyn ProviderAdapter,
    transport: &dyn HttpTransport,
    payload: &RequestPayload,
) -> Result<String> {
    let provider = adapter.id();
    let request = adapter.build_wire_request(payload)?;

    tracing::debug!(
        "Dispatching {} messages to {} ({})",
        payload.messages.len(),
        provider,
        payload.model
    );

    let response = transport
        .post_json(&request)
        .await
        .map_err(|e| match e {
            TransportError::Timeout(timeout) => MindError::ProviderTimeout {
                provider: provider.to_string(),
                secs: timeout.as_secs(),
            },
            TransportError::Http(err) => MindError::provider(provider.to_string(), err.to_string()),
        })?;

    adapter.interpret_response(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, Message, OpenAiCompatAdapter, ProviderId};
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<WireRequest>>,
        reply: fn() -> std::result::Result<WireResponse, TransportError>,
    }

    #[async_trait::async_trait]
    impl HttpTransport for Recording {
        async fn post_json(
            &self,
            request: &WireRequest,
        ) -> std::result::Result<WireResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            (self.reply)()
        }
    }

    fn payload() -> RequestPayload {
        RequestPayload {
            model: "gpt-4".into(),
            messages: vec![ChatMessage::from(&Message::user("ping"))],
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn dispatch_returns_extracted_text() {
        let transport = Recording {
            seen: Mutex::new(Vec::new()),
            reply: || Ok(WireResponse::ok(r#"{"choices":[{"message":{"content":"pong"}}]}"#)),
        };
        let adapter = OpenAiCompatAdapter::new(ProviderId::ChatGpt, "k");

        let text = dispatch(&adapter, &transport, &payload()).await.unwrap();
        assert_eq!(text, "pong");

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "https://api.openai.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn timeout_maps_to_provider_timeout() {
        let transport = Recording {
            seen: Mutex::new(Vec::new()),
            reply: || Err(TransportError::Timeout(Duration::from_secs(30))),
        };
        let adapter = OpenAiCompatAdapter::new(ProviderId::DeepSeek, "k");

        let err = dispatch(&adapter, &transport, &payload()).await.unwrap_err();
        assert!(matches!(
            err,
            MindError::ProviderTimeout { provider, secs: 30 } if provider == "deepseek"
        ));
    }
}
