use mindai_core::directive::download_name;
use mindai_core::{
    Attachment, DisplayRole, DownloadSink, ElementId, FileDescriptor, MessageBody, Renderer,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Prints the transcript as plain text and remembers the files offered by
/// the most recent answer.
pub struct TerminalRenderer<W: Write + Send> {
    out: Mutex<W>,
    last_files: Mutex<Vec<FileDescriptor>>,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            last_files: Mutex::new(Vec::new()),
        }
    }

    /// Files from the last assistant message, in download order.
    pub fn last_files(&self) -> Vec<FileDescriptor> {
        self.last_files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, text: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}

fn label(role: DisplayRole) -> &'static str {
    match role {
        DisplayRole::User => "you",
        DisplayRole::Assistant => "mind-ai",
        DisplayRole::Error => "error",
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render_message(
        &self,
        role: DisplayRole,
        body: &MessageBody,
        attachment: Option<&Attachment>,
    ) -> ElementId {
        let mut text = format!("{}> {}", label(role), body.to_plain());
        match attachment {
            Some(Attachment::Image { mime_type, .. }) => {
                text.push_str(&format!("\n  [image attached: {mime_type}]"))
            }
            Some(Attachment::TextDocument { name, .. }) => {
                text.push_str(&format!("\n  [file attached: {name}]"))
            }
            None => {}
        }
        self.write(&text);

        if role == DisplayRole::Assistant {
            if let Ok(mut files) = self.last_files.lock() {
                *files = body.files.clone();
            }
        }
        ElementId::new()
    }

    fn render_loading_placeholder(&self) -> ElementId {
        self.write("...");
        ElementId::new()
    }

    // Printed lines cannot be taken back.
    fn remove_element(&self, _id: ElementId) {}
}

/// Saves generated files into a downloads directory.
pub struct FileDownloadSink {
    dir: PathBuf,
}

impl FileDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/Downloads`, falling back to the current directory.
    pub fn default_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, title: &str, extension: &str) -> PathBuf {
        self.dir.join(download_name(title, extension))
    }
}

#[async_trait::async_trait]
impl DownloadSink for FileDownloadSink {
    async fn trigger_download(
        &self,
        title: &str,
        extension: &str,
        content: &str,
    ) -> mindai_core::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(title, extension);
        tokio::fs::write(&path, content).await?;
        tracing::info!("Saved {}", path.display());
        Ok(())
    }
}
