pub mod attachment;
pub mod config;
pub mod constants;
pub mod context;
pub mod directive;
pub mod error;
pub mod llm;
pub mod markup;
pub mod orchestrator;
pub mod render;

// Re-export key types
pub use attachment::{Attachment, AttachmentIngestor};
pub use config::Settings;
pub use context::{ConversationStore, FileKvStore, KvStore, MemoryKvStore, MessageComposer};
pub use directive::{FileDescriptor, ParsedReply};
pub use error::{MindError, Result};
pub use llm::{
    HttpTransport, Message, ProviderAdapter, ProviderId, ProviderRegistry, ProviderRouter,
    ReqwestTransport, Role,
};
pub use markup::MessageBody;
pub use orchestrator::{Orchestrator, RequestState, TurnOutcome, TurnPhase};
pub use render::{DisplayRole, DownloadSink, ElementId, Renderer};
