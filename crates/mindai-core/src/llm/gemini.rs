use crate::attachment::split_data_url;
use crate::constants::endpoints;
use crate::error::{MindError, Result};
use crate::llm::provider::ProviderId;
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct GeminiAdapter {
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: ProviderId::Gemini.default_model().to_string(),
            base_url: endpoints::GEMINI_BASE_URL.to_string(),
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

    fn convert_parts(content: &MessageContent) -> Vec<Part> {
        match content {
            MessageContent::Text(text) => vec![Part::Text { text: text.clone() }],
            MessageContent::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => Part::Text { text: text.clone() },
                    ContentPart::ImageUrl { image_url } => match split_data_url(&image_url.url) {
                        Some((mime_type, data)) => Part::InlineData {
                            inline_data: InlineData {
                                mime_type: mime_type.to_string(),
                                data: data.to_string(),
                            },
                        },
                        // Remote URLs are not fetched; the model gets the link as text.
                        None => Part::Text {
                            text: image_url.url.clone(),
                        },
                    },
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl ProviderAdapter for GeminiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![("x-goog-api-key".to_string(), self.api_key.clone())]
    }

    fn build_wire_request(&self, payload: &RequestPayload) -> Result<WireRequest> {
        let contents = payload
            .conversation()
            .map(|m| Content {
                role: Some(match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                }),
                parts: Self::convert_parts(&m.content),
            })
            .collect();

        let system_instruction = payload.system_prompt().map(|text| Content {
            role: None,
            parts: vec![Part::Text { text }],
        });

        let generation_config = if payload.temperature.is_some() || payload.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: payload.temperature,
                max_output_tokens: payload.max_tokens,
            })
        } else {
            None
        };

        let body = serde_json::to_value(GenerateContentRequest {
            contents,
            system_instruction,
            generation_config,
        })?;

        Ok(WireRequest {
            url: self.endpoint_url(&payload.model),
            headers: self.auth_headers(),
            body,
        })
    }

    fn extract_text(&self, body: &Value) -> Result<String> {
        let response: GenerateContentResponse = serde_json::from_value(body.clone())
            .map_err(|_| MindError::malformed("gemini"))?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| MindError::malformed("gemini"))?;

        let texts: Vec<String> = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if texts.is_empty() {
            return Err(MindError::malformed("gemini"));
        }
        Ok(texts.join(""))
    }
}
