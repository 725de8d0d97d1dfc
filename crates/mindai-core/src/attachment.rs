use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MindError, Result};

/// A user-picked file, normalized for sending to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    Image { mime_type: String, data_url: String },
    TextDocument { name: String, text: String },
}

impl Attachment {
    /// Data URL of an image attachment, for previews.
    pub fn preview_url(&self) -> Option<&str> {
        match self {
            Self::Image { data_url, .. } => Some(data_url),
            Self::TextDocument { .. } => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// Turns raw files into [`Attachment`]s.
pub struct AttachmentIngestor;

impl AttachmentIngestor {
    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn ingest_path(path: impl AsRef<Path>) -> Result<Attachment> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MindError::unreadable(&name, e.to_string()))?;

        tracing::debug!("Ingested {} ({}, {} bytes)", name, mime, bytes.len());
        Ok(Self::ingest_bytes(name, &mime, &bytes))
    }

    /// Normalize an in-memory upload.
    ///
    /// Images become data URLs. Everything else is decoded as text; binary
    /// formats such as PDF come through garbled, which is accepted.
    pub fn ingest_bytes(name: impl Into<String>, mime_type: &str, bytes: &[u8]) -> Attachment {
        if mime_type.starts_with("image/") {
            Attachment::Image {
                mime_type: mime_type.to_string(),
                data_url: format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(bytes)),
            }
        } else {
            Attachment::TextDocument {
                name: name.into(),
                text: String::from_utf8_lossy(bytes).into_owned(),
            }
        }
    }
}

/// Split a `data:<mime>;base64,<payload>` URL into its MIME type and payload.
pub fn split_data_url(data_url: &str) -> Option<(&str, &str)> {
    let rest = data_url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    Some((mime, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_bytes_become_data_url() {
        let att = AttachmentIngestor::ingest_bytes("q.png", "image/png", b"abc");
        assert_eq!(
            att,
            Attachment::Image {
                mime_type: "image/png".into(),
                data_url: "data:image/png;base64,YWJj".into(),
            }
        );
        assert_eq!(att.preview_url(), Some("data:image/png;base64,YWJj"));
    }

    #[test]
    fn other_bytes_become_text() {
        let att = AttachmentIngestor::ingest_bytes("notes.txt", "text/plain", "مرحبا".as_bytes());
        assert_eq!(
            att,
            Attachment::TextDocument {
                name: "notes.txt".into(),
                text: "مرحبا".into(),
            }
        );
        assert!(!att.is_image());
    }

    #[test]
    fn binary_documents_are_read_lossily() {
        let att = AttachmentIngestor::ingest_bytes("exam.pdf", "application/pdf", &[0x25, 0xff, 0x50]);
        match att {
            Attachment::TextDocument { text, .. } => assert!(text.contains('\u{fffd}')),
            other => panic!("expected text document, got {other:?}"),
        }
    }

    #[test]
    fn split_data_url_parts() {
        assert_eq!(
            split_data_url("data:image/jpeg;base64,AAAA"),
            Some(("image/jpeg", "AAAA"))
        );
        assert_eq!(split_data_url("https://example.com/a.png"), None);
        assert_eq!(split_data_url("data:image/png,raw"), None);
    }

    #[tokio::test]
    async fn ingest_path_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answer.py");
        std::fs::write(&path, "print(1)").unwrap();

        let att = AttachmentIngestor::ingest_path(&path).await.unwrap();
        assert_eq!(
            att,
            Attachment::TextDocument {
                name: "answer.py".into(),
                text: "print(1)".into(),
            }
        );
    }

    #[tokio::test]
    async fn ingest_path_guesses_image_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("question.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let att = AttachmentIngestor::ingest_path(&path).await.unwrap();
        assert!(matches!(att, Attachment::Image { ref mime_type, .. } if mime_type == "image/png"));
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let err = AttachmentIngestor::ingest_path("/definitely/not/here.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, MindError::UnreadableFile { ref name, .. } if name == "here.txt"));
    }
}
