use crate::constants::{app, storage};
use crate::context::persistence::KvStore;
use crate::error::Result;
use crate::llm::Message;
use std::sync::Arc;

/// Ordered, append-only conversation history with durable persistence.
///
/// History itself is unbounded; only the slice handed out by
/// [`ConversationStore::windowed`] is capped.
pub struct ConversationStore {
    messages: Vec<Message>,
    kv: Arc<dyn KvStore>,
    key: String,
}

impl ConversationStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_key(kv, Self::default_key())
    }

    pub fn with_key(kv: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            kv,
            key: key.into(),
        }
    }

    pub fn default_key() -> String {
        format!("{}{}", app::APP_NAME, storage::HISTORY_KEY_SUFFIX)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The last `n` messages, oldest first.
    pub fn windowed(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Write the full history to the durable store.
    pub async fn persist(&self) -> Result<()> {
        let snapshot = serde_json::to_string(&self.messages)?;
        self.kv.set(&self.key, snapshot).await
    }

    /// Replace the in-memory history with the persisted one.
    ///
    /// Absent, unreadable, or corrupt history yields an empty session.
    /// Returns the number of messages loaded.
    pub async fn restore(&mut self) -> usize {
        self.messages = match self.kv.get(&self.key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Message>>(&raw) {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::warn!("Discarding corrupt history under {:?}: {}", self.key, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read history under {:?}: {}", self.key, e);
                Vec::new()
            }
        };
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryKvStore;
    use crate::llm::Role;

    #[test]
    fn windowed_returns_most_recent_in_order() {
        let mut store = ConversationStore::new(Arc::new(MemoryKvStore::new()));
        for i in 1..=15 {
            store.append(Message::user(format!("Message {i}")));
        }

        let window = store.windowed(10);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].content, "Message 6");
        assert_eq!(window[9].content, "Message 15");
        assert_eq!(store.len(), 15);
    }

    #[test]
    fn windowed_on_short_history_returns_everything() {
        let mut store = ConversationStore::new(Arc::new(MemoryKvStore::new()));
        store.append(Message::user("q"));
        store.append(Message::assistant("a"));
        assert_eq!(store.windowed(10).len(), 2);
        assert!(store.windowed(0).is_empty());
    }

    #[test]
    fn default_key_is_application_scoped() {
        assert_eq!(ConversationStore::default_key(), "Mind AI Study Helper_history");
    }

    #[tokio::test]
    async fn persist_then_restore() {
        let kv = Arc::new(MemoryKvStore::new());
        let mut store = ConversationStore::new(kv.clone());
        store.append(Message::user("سؤال"));
        store.append(Message::assistant("جواب"));
        store.persist().await.unwrap();

        let mut reloaded = ConversationStore::new(kv);
        assert_eq!(reloaded.restore().await, 2);
        assert_eq!(reloaded.messages()[0].role, Role::User);
        assert_eq!(reloaded.messages()[1].content, "جواب");
    }

    #[tokio::test]
    async fn corrupt_history_restores_empty() {
        let kv = Arc::new(MemoryKvStore::with_entry(
            ConversationStore::default_key(),
            "{not json",
        ));
        let mut store = ConversationStore::new(kv);
        store.append(Message::user("stale"));
        assert_eq!(store.restore().await, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn missing_history_restores_empty() {
        let mut store = ConversationStore::new(Arc::new(MemoryKvStore::new()));
        assert_eq!(store.restore().await, 0);
    }
}
