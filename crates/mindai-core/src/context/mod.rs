mod history;
mod composer;
pub mod system_prompt;
pub mod persistence;

pub use history::ConversationStore;
pub use composer::MessageComposer;
pub use system_prompt::SystemPromptBuilder;
pub use persistence::{FileKvStore, KvStore, MemoryKvStore};
