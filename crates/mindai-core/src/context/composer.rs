use crate::attachment::Attachment;
use crate::constants::chat;
use crate::context::history::ConversationStore;
use crate::context::system_prompt::SystemPromptBuilder;
use crate::error::{MindError, Result};
use crate::llm::{ChatMessage, ContentPart, Message, MessageContent, RequestPayload, Role};

/// Assembles outgoing requests: system prompt, windowed history, and the new
/// multi-part user message.
pub struct MessageComposer {
    system_prompt: String,
    window_size: usize,
    temperature: f32,
    max_tokens: u32,
}

impl MessageComposer {
    pub fn new() -> Self {
        Self {
            system_prompt: SystemPromptBuilder::new().build(),
            window_size: chat::WINDOW_SIZE,
            temperature: chat::TEMPERATURE,
            max_tokens: chat::MAX_TOKENS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Build the request for a new turn. Nothing is written to `store`.
    pub fn compose(
        &self,
        model: &str,
        store: &ConversationStore,
        attachment: Option<&Attachment>,
        user_text: &str,
    ) -> Result<RequestPayload> {
        let user_text = user_text.trim();
        if user_text.is_empty() && attachment.is_none() {
            return Err(MindError::EmptyRequest);
        }

        let mut messages = Vec::with_capacity(self.window_size + 2);
        messages.push(ChatMessage::from(&Message::system(&self.system_prompt)));
        messages.extend(store.windowed(self.window_size).iter().map(ChatMessage::from));
        messages.push(ChatMessage {
            role: Role::User,
            content: MessageContent::Parts(Self::user_parts(attachment, user_text)),
        });

        Ok(RequestPayload {
            model: model.to_string(),
            messages,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        })
    }

    /// A bare one-message request: no system prompt, no history.
    pub fn single_prompt(model: &str, prompt: &str) -> RequestPayload {
        RequestPayload {
            model: model.to_string(),
            messages: vec![ChatMessage::from(&Message::user(prompt))],
            temperature: None,
            max_tokens: None,
        }
    }

    /// Text stored in history for a turn; the default instruction stands in
    /// for attachment-only sends.
    pub fn stored_user_text(user_text: &str) -> String {
        let trimmed = user_text.trim();
        if trimmed.is_empty() {
            chat::DEFAULT_INSTRUCTION.to_string()
        } else {
            trimmed.to_string()
        }
    }

    fn user_parts(attachment: Option<&Attachment>, user_text: &str) -> Vec<ContentPart> {
        let mut parts = vec![ContentPart::text(Self::stored_user_text(user_text))];

        match attachment {
            Some(Attachment::Image { data_url, .. }) => parts.push(ContentPart::image(data_url)),
            Some(Attachment::TextDocument { name, text }) => parts.push(ContentPart::text(format!(
                "[attached file: {}]\ncontent:\n{}\n",
                name, text
            ))),
            None => {}
        }

        parts
    }
}

impl Default for MessageComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryKvStore;
    use std::sync::Arc;

    fn store_with(n: usize) -> ConversationStore {
        let mut store = ConversationStore::new(Arc::new(MemoryKvStore::new()));
        for i in 0..n {
            if i % 2 == 0 {
                store.append(Message::user(format!("q{i}")));
            } else {
                store.append(Message::assistant(format!("a{i}")));
            }
        }
        store
    }

    #[test]
    fn text_only_request() {
        let composer = MessageComposer::new().with_system_prompt("sys");
        let payload = composer.compose("m", &store_with(0), None, "  hello  ").unwrap();

        assert_eq!(payload.model, "m");
        assert_eq!(payload.messages.len(), 2);
        assert_eq!(payload.messages[0].role, Role::System);
        assert_eq!(
            payload.messages[1].content,
            MessageContent::Parts(vec![ContentPart::text("hello")])
        );
        assert_eq!(payload.temperature, Some(0.3));
        assert_eq!(payload.max_tokens, Some(4000));
    }

    #[test]
    fn window_is_capped_at_ten_prior_messages() {
        let composer = MessageComposer::new();
        for history in [0, 3, 10, 11, 57] {
            let payload = composer.compose("m", &store_with(history), None, "next").unwrap();
            let prior = payload.messages.len() - 2;
            assert_eq!(prior, history.min(10));
            assert_eq!(
                payload.messages.iter().filter(|m| m.role == Role::System).count(),
                1
            );
        }

        let payload = composer.compose("m", &store_with(57), None, "next").unwrap();
        assert_eq!(payload.messages[1].content, MessageContent::Text("a47".into()));
    }

    #[test]
    fn image_only_uses_default_instruction() {
        let image = Attachment::Image {
            mime_type: "image/png".into(),
            data_url: "data:image/png;base64,AAAA".into(),
        };
        let payload = MessageComposer::new()
            .compose("m", &store_with(0), Some(&image), "")
            .unwrap();

        assert_eq!(
            payload.messages.last().unwrap().content,
            MessageContent::Parts(vec![
                ContentPart::text("analyze this image/file in detail"),
                ContentPart::image("data:image/png;base64,AAAA"),
            ])
        );
    }

    #[test]
    fn text_document_is_inlined() {
        let doc = Attachment::TextDocument {
            name: "lab.txt".into(),
            text: "v = 3".into(),
        };
        let payload = MessageComposer::new()
            .compose("m", &store_with(0), Some(&doc), "summarize")
            .unwrap();

        assert_eq!(
            payload.messages.last().unwrap().content,
            MessageContent::Parts(vec![
                ContentPart::text("summarize"),
                ContentPart::text("[attached file: lab.txt]\ncontent:\nv = 3\n"),
            ])
        );
    }

    #[test]
    fn empty_request_is_rejected() {
        let err = MessageComposer::new()
            .compose("m", &store_with(0), None, "   ")
            .unwrap_err();
        assert!(matches!(err, MindError::EmptyRequest));
    }

    #[test]
    fn compose_does_not_touch_history() {
        let store = store_with(2);
        MessageComposer::new().compose("m", &store, None, "hi").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn single_prompt_is_bare() {
        let payload = MessageComposer::single_prompt("gpt-4", "hello");
        assert_eq!(payload.messages.len(), 1);
        assert_eq!(payload.messages[0].content, MessageContent::Text("hello".into()));
        assert!(payload.temperature.is_none());
    }
}
