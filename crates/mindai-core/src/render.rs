//! Front-end collaborators driven by the orchestrator.

use crate::attachment::Attachment;
use crate::error::Result;
use crate::markup::MessageBody;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who a rendered message is attributed to. Errors get their own role so
/// front ends can style them apart from model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayRole {
    User,
    Assistant,
    Error,
}

/// Handle to a rendered element, used to remove it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(uuid::Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait Renderer: Send + Sync {
    fn render_message(
        &self,
        role: DisplayRole,
        body: &MessageBody,
        attachment: Option<&Attachment>,
    ) -> ElementId;

    fn render_loading_placeholder(&self) -> ElementId;

    fn remove_element(&self, id: ElementId);
}

/// Receives generated files. Content is always offered as `text/plain`.
#[async_trait::async_trait]
pub trait DownloadSink: Send + Sync {
    async fn trigger_download(&self, title: &str, extension: &str, content: &str) -> Result<()>;
}
