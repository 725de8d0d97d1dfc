use crate::attachment::{Attachment, AttachmentIngestor};
use crate::constants::chat;
use crate::context::{ConversationStore, MessageComposer};
use crate::directive::FileDescriptor;
use crate::error::{MindError, Result};
use crate::llm::{dispatch, HttpTransport, Message, ProviderId, ProviderRouter, Role};
use crate::markup::MessageBody;
use crate::render::{DisplayRole, DownloadSink, ElementId, Renderer};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Where the orchestrator is within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Composing,
    AwaitingResponse,
    Rendering,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    InFlight,
}

#[derive(Debug)]
struct OrchestratorState {
    phase: TurnPhase,
    pending_attachment: Option<Attachment>,
}

/// How a call to [`Orchestrator::send`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Another turn was in flight; nothing happened.
    Ignored,
    /// No text and no attachment; nothing happened.
    Empty,
    Completed { provider: ProviderId, body: MessageBody },
    Failed { message: String },
}

/// Drives one conversation: renders turns, talks to the provider, keeps
/// history. At most one turn is in flight at a time.
pub struct Orchestrator {
    router: Arc<ProviderRouter>,
    transport: Arc<dyn HttpTransport>,
    renderer: Arc<dyn Renderer>,
    composer: MessageComposer,
    store: tokio::sync::Mutex<ConversationStore>,
    state: Mutex<OrchestratorState>,
    explicit_provider: Option<String>,
    restore_limit: usize,
}

impl Orchestrator {
    pub fn new(
        router: Arc<ProviderRouter>,
        transport: Arc<dyn HttpTransport>,
        renderer: Arc<dyn Renderer>,
        store: ConversationStore,
    ) -> Result<Self> {
        if router.registry().is_empty() {
            return Err(MindError::NoProviderSelected);
        }
        Ok(Self {
            router,
            transport,
            renderer,
            composer: MessageComposer::new(),
            store: tokio::sync::Mutex::new(store),
            state: Mutex::new(OrchestratorState {
                phase: TurnPhase::Idle,
                pending_attachment: None,
            }),
            explicit_provider: None,
            restore_limit: chat::RESTORE_LIMIT,
        })
    }

    pub fn with_composer(mut self, composer: MessageComposer) -> Self {
        self.composer = composer;
        self
    }

    /// Pin the conversation to one provider. `None` or an empty name means
    /// every turn is auto-routed.
    pub fn with_provider(mut self, provider: Option<String>) -> Self {
        self.explicit_provider = provider.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_restore_limit(mut self, limit: usize) -> Self {
        self.restore_limit = limit;
        self
    }

    pub fn explicit_provider(&self) -> Option<&str> {
        self.explicit_provider.as_deref()
    }

    /// Load persisted history and re-render its tail. Returns the number of
    /// messages rendered.
    pub async fn restore(&self) -> usize {
        let mut store = self.store.lock().await;
        let loaded = store.restore().await;
        tracing::info!("Restored {} messages", loaded);

        let mut rendered = 0;
        for message in store.windowed(self.restore_limit) {
            let (role, body) = match message.role {
                Role::User => (DisplayRole::User, MessageBody::plain(&message.content)),
                Role::Assistant => (DisplayRole::Assistant, MessageBody::from_reply(&message.content)),
                Role::System => continue,
            };
            self.renderer.render_message(role, &body, None);
            rendered += 1;
        }
        rendered
    }

    /// Set the pending attachment, replacing any previous one.
    pub fn attach(&self, attachment: Attachment) {
        self.with_state(|state| state.pending_attachment = Some(attachment));
    }

    /// Read a file and make it the pending attachment. On failure no
    /// attachment is left pending.
    pub async fn attach_file(&self, path: impl AsRef<Path>) -> Result<()> {
        match AttachmentIngestor::ingest_path(path).await {
            Ok(attachment) => {
                self.attach(attachment);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.clear_attachment();
                Err(e)
            }
        }
    }

    pub fn clear_attachment(&self) {
        self.with_state(|state| state.pending_attachment = None);
    }

    pub fn pending_attachment(&self) -> Option<Attachment> {
        self.with_state(|state| state.pending_attachment.clone())
    }

    pub fn phase(&self) -> TurnPhase {
        self.with_state(|state| state.phase)
    }

    pub fn request_state(&self) -> RequestState {
        match self.phase() {
            TurnPhase::Idle => RequestState::Idle,
            _ => RequestState::InFlight,
        }
    }

    /// Snapshot of the stored history.
    pub async fn history(&self) -> Vec<Message> {
        self.store.lock().await.messages().to_vec()
    }

    /// Run one turn with `text` and the pending attachment.
    ///
    /// Ignored while another turn is in flight. Errors never escape: they
    /// are rendered as an error message and reported in the outcome.
    pub async fn send(&self, text: &str) -> TurnOutcome {
        let attachment = {
            let mut state = lock_state(&self.state);
            if state.phase != TurnPhase::Idle {
                tracing::debug!("Send ignored: a turn is already in flight");
                return TurnOutcome::Ignored;
            }
            if text.trim().is_empty() && state.pending_attachment.is_none() {
                return TurnOutcome::Empty;
            }
            state.phase = TurnPhase::Composing;
            state.pending_attachment.take()
        };
        let _idle = IdleOnDrop(&self.state);

        self.renderer.render_message(
            DisplayRole::User,
            &MessageBody::plain(text.trim()),
            attachment.as_ref(),
        );
        let placeholder = self.renderer.render_loading_placeholder();

        match self.run_turn(text, attachment.as_ref()).await {
            Ok((provider, raw)) => self.finish_turn(placeholder, provider, text, raw).await,
            Err(e) => {
                self.set_phase(TurnPhase::Failed);
                tracing::error!("Turn failed: {}", e);
                self.renderer.remove_element(placeholder);
                let message = e.user_message();
                self.renderer
                    .render_message(DisplayRole::Error, &MessageBody::plain(&message), None);
                TurnOutcome::Failed { message }
            }
        }
    }

    async fn run_turn(
        &self,
        text: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(ProviderId, String)> {
        let adapter = self.router.resolve(self.explicit_provider(), text)?;
        let payload = {
            let store = self.store.lock().await;
            self.composer.compose(adapter.model(), &store, attachment, text)?
        };

        self.set_phase(TurnPhase::AwaitingResponse);
        let raw = dispatch(adapter.as_ref(), self.transport.as_ref(), &payload).await?;
        Ok((adapter.id(), raw))
    }

    async fn finish_turn(
        &self,
        placeholder: ElementId,
        provider: ProviderId,
        text: &str,
        raw: String,
    ) -> TurnOutcome {
        self.set_phase(TurnPhase::Rendering);
        self.renderer.remove_element(placeholder);

        let body = MessageBody::from_reply(&raw);
        self.renderer.render_message(DisplayRole::Assistant, &body, None);

        let mut store = self.store.lock().await;
        store.append(Message::user(MessageComposer::stored_user_text(text)));
        store.append(Message::assistant(raw));
        if let Err(e) = store.persist().await {
            tracing::warn!("Failed to persist history: {}", e);
        }

        TurnOutcome::Completed { provider, body }
    }

    /// Hand a generated file to `sink`.
    pub async fn download(&self, sink: &dyn DownloadSink, file: &FileDescriptor) -> Result<()> {
        sink.trigger_download(&file.title, &file.file_type, &file.content)
            .await
    }

    fn set_phase(&self, phase: TurnPhase) {
        self.with_state(|state| state.phase = phase);
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut OrchestratorState) -> T) -> T {
        f(&mut lock_state(&self.state))
    }
}

fn lock_state(state: &Mutex<OrchestratorState>) -> MutexGuard<'_, OrchestratorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns the orchestrator to `Idle` however the turn ends. An attachment
/// picked while the turn was in flight is discarded with it.
struct IdleOnDrop<'a>(&'a Mutex<OrchestratorState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        let mut state = lock_state(self.0);
        state.phase = TurnPhase::Idle;
        state.pending_attachment = None;
    }
}
